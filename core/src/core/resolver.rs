//! Slash-delimited path resolution
//!
//! Walks the credential tree from a starting group to a target group or
//! (group, entry) pair. Path syntax follows the Unix shape: `/` separates
//! segments, `.` and empty segments are no-ops, `..` ascends, a leading `/`
//! re-bases at the database root. At each level a segment matches a child
//! group by exact name first, then a child entry by exact title, then by
//! zero-based position in the current entry listing. Groups deliberately
//! shadow entries of the same name.

use crate::core::ancestors::{parent_of, NodeId};
use crate::core::errors::{Error, Result};
use crate::models::{Entry, Group};

/// Resolve `path` against `start`, returning the target group and, when the
/// path addresses an entry, that entry together with its parent group.
pub fn resolve<'a>(
    root: &'a Group,
    start: &'a Group,
    path: &str,
) -> Result<(&'a Group, Option<&'a Entry>)> {
    if path == "/" {
        return Ok((root, None));
    }

    let (mut current, remainder) = match path.strip_prefix('/') {
        Some(rest) => (root, rest),
        None => (start, path),
    };

    // A trailing slash has no effect; `.` and empty segments are no-ops.
    let segments: Vec<&str> = remainder
        .strip_suffix('/')
        .unwrap_or(remainder)
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    for (index, segment) in segments.iter().enumerate() {
        let last = index == segments.len() - 1;

        if *segment == ".." {
            if current.uuid() == root.uuid() {
                return Err(Error::invalid_path("cannot go above root"));
            }
            current = parent_of(root, NodeId::Group(current.uuid()))
                .ok_or_else(|| Error::corrupted(format!("group '{}' has no findable ancestor chain", current.name())))?;
            continue;
        }

        if let Some(group) = current.groups().iter().find(|g| g.name() == *segment) {
            current = group;
            continue;
        }

        let entry = current
            .entries()
            .iter()
            .find(|e| e.title() == *segment)
            .or_else(|| {
                segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| current.entries().get(i))
            });

        match entry {
            Some(entry) => {
                if !last {
                    return Err(Error::invalid_path(format!(
                        "{segment} is an entry, not a group"
                    )));
                }
                return Ok((current, Some(entry)));
            }
            None => {
                return Err(Error::NotFound {
                    name: (*segment).to_string(),
                })
            }
        }
    }

    Ok((current, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root / Work { GitHub, Mail } / Dev { CI }
    fn sample_tree() -> Group {
        let mut root = Group::new_root();
        let work = root.new_subgroup("Work").unwrap();
        work.new_entry("GitHub").unwrap();
        work.new_entry("Mail").unwrap();
        let dev = work.new_subgroup("Dev").unwrap();
        dev.new_entry("CI").unwrap();
        root
    }

    #[test]
    fn test_slash_resolves_to_root() {
        let root = sample_tree();
        let start = &root.groups()[0];
        let (group, entry) = resolve(&root, start, "/").unwrap();
        assert_eq!(group.uuid(), root.uuid());
        assert!(entry.is_none());
    }

    #[test]
    fn test_empty_path_resolves_to_start() {
        let root = sample_tree();
        let start = &root.groups()[0];
        let (group, entry) = resolve(&root, start, "").unwrap();
        assert_eq!(group.uuid(), start.uuid());
        assert!(entry.is_none());
    }

    #[test]
    fn test_relative_entry_resolution() {
        let root = sample_tree();
        let (group, entry) = resolve(&root, &root, "Work/GitHub").unwrap();
        assert_eq!(group.name(), "Work");
        assert_eq!(entry.unwrap().title(), "GitHub");
    }

    #[test]
    fn test_absolute_path_rebases_at_root() {
        let root = sample_tree();
        let dev = &root.groups()[0].groups()[0];
        let (group, entry) = resolve(&root, dev, "/Work/Mail").unwrap();
        assert_eq!(group.name(), "Work");
        assert_eq!(entry.unwrap().title(), "Mail");
    }

    #[test]
    fn test_positional_index_resolution() {
        let root = sample_tree();
        let (_, entry) = resolve(&root, &root, "Work/0").unwrap();
        assert_eq!(entry.unwrap().title(), "GitHub");
        let (_, entry) = resolve(&root, &root, "Work/1").unwrap();
        assert_eq!(entry.unwrap().title(), "Mail");
    }

    #[test]
    fn test_index_out_of_range_is_not_found() {
        let root = sample_tree();
        let err = resolve(&root, &root, "Work/9").unwrap_err();
        assert!(matches!(err, Error::NotFound { ref name } if name == "9"));
    }

    #[test]
    fn test_entry_before_final_segment_is_invalid() {
        let root = sample_tree();
        let err = resolve(&root, &root, "Work/GitHub/x").unwrap_err();
        assert!(matches!(err, Error::InvalidPath { ref message }
            if message == "GitHub is an entry, not a group"));
    }

    #[test]
    fn test_ascend_above_root_errors() {
        let root = sample_tree();
        let err = resolve(&root, &root, "..").unwrap_err();
        assert!(matches!(err, Error::InvalidPath { ref message }
            if message == "cannot go above root"));
    }

    #[test]
    fn test_dotdot_ascends() {
        let root = sample_tree();
        let dev = &root.groups()[0].groups()[0];
        let (group, entry) = resolve(&root, dev, "../..").unwrap();
        assert_eq!(group.uuid(), root.uuid());
        assert!(entry.is_none());

        let (group, _) = resolve(&root, dev, "../GitHub").unwrap();
        assert_eq!(group.name(), "Work");
    }

    #[test]
    fn test_dot_and_empty_segments_are_noops() {
        let root = sample_tree();
        let (group, entry) = resolve(&root, &root, "./Work//./Dev/").unwrap();
        assert_eq!(group.name(), "Dev");
        assert!(entry.is_none());
    }

    #[test]
    fn test_group_shadows_entry_of_same_name() {
        let mut root = Group::new_root();
        let work = root.new_subgroup("Work").unwrap();
        work.new_entry("Same").unwrap();
        work.new_subgroup("Same").unwrap();

        let (group, entry) = resolve(&root, &root, "Work/Same").unwrap();
        assert_eq!(group.name(), "Same");
        assert!(entry.is_none());
    }

    #[test]
    fn test_missing_segment_is_not_found() {
        let root = sample_tree();
        let err = resolve(&root, &root, "Nope").unwrap_err();
        assert!(matches!(err, Error::NotFound { ref name } if name == "Nope"));
    }

    #[test]
    fn test_index_is_positional_at_call_time() {
        let mut root = Group::new_root();
        let work = root.new_subgroup("Work").unwrap();
        work.new_entry("First").unwrap();
        work.new_entry("Second").unwrap();

        let (_, entry) = resolve(&root, &root, "Work/0").unwrap();
        assert_eq!(entry.unwrap().title(), "First");

        // Remove the first entry; index 0 re-binds to the survivor.
        let work_uuid = root.groups()[0].uuid();
        let first = root.groups()[0].entries()[0].uuid();
        root.find_group_mut(work_uuid)
            .unwrap()
            .remove_entry(first)
            .unwrap();

        let (_, entry) = resolve(&root, &root, "Work/0").unwrap();
        assert_eq!(entry.unwrap().title(), "Second");
    }
}
