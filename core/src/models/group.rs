//! Group nodes for the keytree credential tree
//!
//! A [`Group`] is a named container holding ordered child groups and
//! entries, analogous to a directory. Groups store only downward links;
//! ancestry is reconstructed on demand (see [`crate::core::ancestors`]),
//! because two of the three backing stores have no parent pointers and may
//! copy tree nodes by value. Identity comparison is therefore always by
//! UUID, never by reference.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::Entry;
use crate::core::errors::{Error, Result};

/// A named container node in the credential tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    /// Stable identity, assigned once
    uuid: Uuid,

    /// Group name; the root group's name is always empty
    name: String,

    /// Whether this is the distinguished root group
    #[serde(default)]
    root: bool,

    /// Ordered child groups
    groups: Vec<Group>,

    /// Ordered child entries
    entries: Vec<Entry>,
}

impl Group {
    /// Create the distinguished root group.
    ///
    /// The root has an empty name, no parent, and by convention holds no
    /// entries of its own.
    pub fn new_root() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: String::new(),
            root: true,
            groups: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Reassemble a group from parts a backend driver loaded, preserving
    /// the stored identity
    pub(crate) fn from_parts(
        uuid: Uuid,
        name: String,
        root: bool,
        groups: Vec<Group>,
        entries: Vec<Entry>,
    ) -> Self {
        Self {
            uuid,
            name,
            root,
            groups,
            entries,
        }
    }

    /// Create a detached, non-root group
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            root: false,
            groups: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// The UUID in canonical hyphenated string form
    pub fn uuid_string(&self) -> String {
        self.uuid.to_string()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename this group.
    ///
    /// Sibling uniqueness is the caller's concern here; renames that go
    /// through [`crate::core::database::Database`] are collision-checked
    /// against the parent.
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Ordered child groups; ordering is stable absent mutation
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Ordered child entries; ordering is stable absent mutation
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Create a new subgroup under this group.
    ///
    /// Fails with a duplicate-name error when a sibling group of that name
    /// already exists.
    pub fn new_subgroup<S: Into<String>>(&mut self, name: S) -> Result<&mut Group> {
        self.add_subgroup(Group::new(name))
    }

    /// Create a new entry under this group.
    ///
    /// Fails with a duplicate-name error when a sibling entry of that title
    /// already exists.
    pub fn new_entry<S: Into<String>>(&mut self, title: S) -> Result<&mut Entry> {
        self.add_entry(Entry::new(title))
    }

    /// Attach an existing group under this one, returning the attached node.
    ///
    /// This is the low-level attach primitive; it re-checks sibling name
    /// uniqueness itself so behavior is uniform regardless of which backend
    /// produced the node.
    pub fn add_subgroup(&mut self, group: Group) -> Result<&mut Group> {
        if self.groups.iter().any(|g| g.name == group.name) {
            return Err(Error::DuplicateName { name: group.name });
        }
        self.groups.push(group);
        let last = self.groups.len() - 1;
        Ok(&mut self.groups[last])
    }

    /// Attach an existing entry under this group, re-checking title
    /// uniqueness against the current siblings. Returns the attached node.
    pub fn add_entry(&mut self, entry: Entry) -> Result<&mut Entry> {
        let title = entry.title();
        if self.entries.iter().any(|e| e.title() == title) {
            return Err(Error::DuplicateName { name: title });
        }
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        Ok(&mut self.entries[last])
    }

    /// Remove a direct child group and everything beneath it.
    ///
    /// Descendant entries and subgroups are purged before the group itself
    /// is detached: backing stores that represent children by value must see
    /// them deleted first, or an interrupted detach leaves orphans behind.
    pub fn remove_subgroup(&mut self, uuid: Uuid) -> Result<()> {
        let index = self
            .groups
            .iter()
            .position(|g| g.uuid == uuid)
            .ok_or_else(|| Error::NotFound {
                name: uuid.to_string(),
            })?;

        self.groups[index].purge();
        self.groups.remove(index);
        Ok(())
    }

    /// Remove a direct child entry
    pub fn remove_entry(&mut self, uuid: Uuid) -> Result<Entry> {
        self.detach_entry(uuid).ok_or_else(|| Error::NotFound {
            name: uuid.to_string(),
        })
    }

    /// Recursively delete all descendants, deepest first
    fn purge(&mut self) {
        while let Some(mut child) = self.groups.pop() {
            child.purge();
        }
        self.entries.clear();
    }

    /// Detach a direct child group without purging it (used by moves)
    pub(crate) fn detach_subgroup(&mut self, uuid: Uuid) -> Option<Group> {
        let index = self.groups.iter().position(|g| g.uuid == uuid)?;
        Some(self.groups.remove(index))
    }

    /// Detach a direct child entry without dropping it (used by moves)
    pub(crate) fn detach_entry(&mut self, uuid: Uuid) -> Option<Entry> {
        let index = self.entries.iter().position(|e| e.uuid() == uuid)?;
        Some(self.entries.remove(index))
    }

    /// Find a group by UUID anywhere in this subtree, including self
    pub fn find_group(&self, uuid: Uuid) -> Option<&Group> {
        if self.uuid == uuid {
            return Some(self);
        }
        self.groups.iter().find_map(|g| g.find_group(uuid))
    }

    /// Mutable variant of [`Group::find_group`]
    pub fn find_group_mut(&mut self, uuid: Uuid) -> Option<&mut Group> {
        if self.uuid == uuid {
            return Some(self);
        }
        self.groups.iter_mut().find_map(|g| g.find_group_mut(uuid))
    }

    /// Find an entry by UUID anywhere in this subtree
    pub fn find_entry(&self, uuid: Uuid) -> Option<&Entry> {
        if let Some(entry) = self.entries.iter().find(|e| e.uuid() == uuid) {
            return Some(entry);
        }
        self.groups.iter().find_map(|g| g.find_entry(uuid))
    }

    /// Mutable variant of [`Group::find_entry`]
    pub fn find_entry_mut(&mut self, uuid: Uuid) -> Option<&mut Entry> {
        if let Some(index) = self.entries.iter().position(|e| e.uuid() == uuid) {
            return Some(&mut self.entries[index]);
        }
        self.groups
            .iter_mut()
            .find_map(|g| g.find_entry_mut(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_group() {
        let root = Group::new_root();
        assert!(root.is_root());
        assert_eq!(root.name(), "");
        assert!(root.groups().is_empty());
        assert!(root.entries().is_empty());
    }

    #[test]
    fn test_duplicate_subgroup_rejected() {
        let mut root = Group::new_root();
        root.new_subgroup("A").unwrap();
        let err = root.new_subgroup("A").unwrap_err();
        assert!(matches!(err, Error::DuplicateName { ref name } if name == "A"));
        // Sibling count unchanged from after the first creation.
        assert_eq!(root.groups().len(), 1);
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let mut group = Group::new("Work");
        group.new_entry("GitHub").unwrap();
        let err = group.new_entry("GitHub").unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));
        assert_eq!(group.entries().len(), 1);
    }

    #[test]
    fn test_add_subgroup_rechecks_uniqueness() {
        let mut parent = Group::new("Parent");
        parent.add_subgroup(Group::new("Child")).unwrap();
        let err = parent.add_subgroup(Group::new("Child")).unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));
    }

    #[test]
    fn test_attach_returns_the_attached_node() {
        let mut parent = Group::new("Parent");
        let child = Group::new("Child");
        let child_uuid = child.uuid();
        let attached = parent.add_subgroup(child).unwrap();
        assert_eq!(attached.uuid(), child_uuid);

        let entry = Entry::new("GitHub");
        let entry_uuid = entry.uuid();
        let attached = parent.add_entry(entry).unwrap();
        assert_eq!(attached.uuid(), entry_uuid);
    }

    #[test]
    fn test_remove_subgroup_purges_descendants() {
        let mut root = Group::new_root();
        let work = root.new_subgroup("Work").unwrap();
        let inner = work.new_subgroup("Inner").unwrap();
        inner.new_entry("Deep").unwrap();
        work.new_entry("GitHub").unwrap();

        let work_uuid = root.groups()[0].uuid();
        root.remove_subgroup(work_uuid).unwrap();
        assert!(root.groups().is_empty());
    }

    #[test]
    fn test_remove_unknown_subgroup_fails() {
        let mut root = Group::new_root();
        let err = root.remove_subgroup(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_find_by_uuid() {
        let mut root = Group::new_root();
        let work = root.new_subgroup("Work").unwrap();
        let entry_uuid = work.new_entry("GitHub").unwrap().uuid();
        let group_uuid = work.uuid();

        assert_eq!(root.find_group(group_uuid).unwrap().name(), "Work");
        assert_eq!(root.find_entry(entry_uuid).unwrap().title(), "GitHub");
        assert!(root.find_group(Uuid::new_v4()).is_none());
        assert!(root.find_entry(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_child_ordering_is_stable() {
        let mut root = Group::new_root();
        root.new_subgroup("B").unwrap();
        root.new_subgroup("A").unwrap();
        root.new_subgroup("C").unwrap();

        let names: Vec<&str> = root.groups().iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
        let again: Vec<&str> = root.groups().iter().map(|g| g.name()).collect();
        assert_eq!(names, again);
    }

    #[test]
    fn test_detach_keeps_subtree_intact() {
        let mut root = Group::new_root();
        let work = root.new_subgroup("Work").unwrap();
        work.new_entry("GitHub").unwrap();
        let work_uuid = root.groups()[0].uuid();

        let detached = root.detach_subgroup(work_uuid).unwrap();
        assert_eq!(detached.entries().len(), 1);
        assert!(root.groups().is_empty());
    }
}
