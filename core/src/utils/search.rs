//! Recursive regex search over the credential tree
//!
//! A search walks the subtree under a starting group in listing order and
//! reports canonical paths: group paths for groups whose name matches,
//! entry paths for entries whose searchable values match. The starting
//! group's own name is never tested, so searching from the root does not
//! match the root's empty name against everything.

use regex::Regex;

use crate::core::ancestors;
use crate::models::Group;

/// Search the subtree under `start` for `pattern`, producing canonical
/// paths rendered against `root`.
pub fn search(root: &Group, start: &Group, pattern: &Regex) -> Vec<String> {
    let mut hits = Vec::new();
    walk(root, start, pattern, &mut hits, true);
    hits
}

fn walk(root: &Group, group: &Group, pattern: &Regex, hits: &mut Vec<String>, is_start: bool) {
    if !is_start && pattern.is_match(group.name()) {
        hits.push(ancestors::group_path(root, group));
    }

    for entry in group.entries() {
        if entry.matches(pattern) {
            hits.push(ancestors::entry_path(root, entry));
        }
    }

    for child in group.groups() {
        walk(root, child, pattern, hits, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    /// root / Work { GitHub(user bob), Dev / Registry(user bob) }, root / Personal { Mail }
    fn sample_tree() -> Group {
        let mut root = Group::new_root();
        let work = root.new_subgroup("Work").unwrap();
        let github = work.new_entry("GitHub").unwrap();
        github.set_values(vec![
            Value::string("Title", "GitHub"),
            Value::string("UserName", "bob"),
            Value::password("hunter2"),
        ]);
        let dev = work.new_subgroup("Dev").unwrap();
        let registry = dev.new_entry("Registry").unwrap();
        registry.set_values(vec![
            Value::string("Title", "Registry"),
            Value::string("UserName", "bob"),
        ]);
        let personal = root.new_subgroup("Personal").unwrap();
        personal.new_entry("Mail").unwrap();
        root
    }

    #[test]
    fn test_search_matches_entry_values() {
        let root = sample_tree();
        let pattern = Regex::new("bob").unwrap();
        let hits = search(&root, &root, &pattern);
        assert_eq!(hits, vec!["/Work/GitHub", "/Work/Dev/Registry"]);
    }

    #[test]
    fn test_search_matches_group_names() {
        let root = sample_tree();
        let pattern = Regex::new("^Dev$").unwrap();
        let hits = search(&root, &root, &pattern);
        assert_eq!(hits, vec!["/Work/Dev/"]);
    }

    #[test]
    fn test_search_skips_starting_group_name() {
        let root = sample_tree();
        let work = &root.groups()[0];
        let pattern = Regex::new("Work").unwrap();
        let hits = search(&root, work, &pattern);
        // "Work" matches neither the subtree's groups nor any entry value.
        assert!(hits.is_empty());
    }

    #[test]
    fn test_search_is_scoped_to_start() {
        let root = sample_tree();
        let work = &root.groups()[0];
        let pattern = Regex::new("Mail").unwrap();
        assert!(search(&root, work, &pattern).is_empty());
        assert_eq!(search(&root, &root, &pattern), vec!["/Personal/Mail"]);
    }

    #[test]
    fn test_search_never_matches_protected_values() {
        let root = sample_tree();
        let pattern = Regex::new("hunter2").unwrap();
        assert!(search(&root, &root, &pattern).is_empty());
    }
}
