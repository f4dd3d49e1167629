//! The database session object
//!
//! A [`Database`] owns the in-memory tree loaded from one backend driver,
//! the current-location cursor the shell layer navigates with, and the
//! `changed` flag read once at shutdown to decide whether to prompt for a
//! save. One session owns the tree at a time; cross-process coordination is
//! only the driver's advisory lock.

use regex::Regex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::{Backend, BackendError, StoreVersion};
use crate::core::ancestors::{self, parent_of, NodeId};
use crate::core::errors::{Error, Result};
use crate::core::resolver;
use crate::models::{Entry, Group, Value};

/// One open store session
pub struct Database {
    backend: Box<dyn Backend>,
    root: Group,
    current: Uuid,
    changed: bool,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("root", &self.root)
            .field("current", &self.current)
            .field("changed", &self.changed)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open the store behind `backend`: initialize the driver, take the
    /// advisory lock and load the tree.
    ///
    /// A lock marker left by another session surfaces as [`Error::Locked`];
    /// passing `force_lock` takes the marker anyway (the human-override
    /// path).
    pub fn open(mut backend: Box<dyn Backend>, force_lock: bool) -> Result<Self> {
        backend.init()?;
        match backend.lock(force_lock) {
            Ok(()) => {}
            Err(BackendError::LockHeld { path }) => return Err(Error::Locked { path }),
            Err(err) => return Err(err.into()),
        }
        let root = backend.root()?;
        let current = root.uuid();
        info!(version = %backend.version(), "store opened");
        Ok(Self {
            backend,
            root,
            current,
            changed: false,
        })
    }

    /// The root group
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// The store format of the active driver
    pub fn version(&self) -> StoreVersion {
        self.backend.version()
    }

    /// Look up an out-of-band binary attachment on the driver
    pub fn binary(&self, id: u64, name: &str) -> Result<Option<Value>> {
        Ok(self.backend.binary(id, name)?)
    }

    /// Whether any mutation happened since open or the last save
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// The current-location cursor group. Falls back to the root when the
    /// cursor's group is no longer part of the tree.
    pub fn current(&self) -> &Group {
        self.root.find_group(self.current).unwrap_or(&self.root)
    }

    /// Move the cursor to the group addressed by `path`
    pub fn change_current(&mut self, path: &str) -> Result<()> {
        let (group, entry) = self.resolve(path)?;
        if entry.is_some() {
            return Err(Error::invalid_path(format!(
                "{path} is an entry, not a group"
            )));
        }
        self.current = group.uuid();
        Ok(())
    }

    /// Resolve `path` relative to the cursor (absolute paths re-base at the
    /// root)
    pub fn resolve(&self, path: &str) -> Result<(&Group, Option<&Entry>)> {
        resolver::resolve(&self.root, self.current(), path)
    }

    /// Canonical path of a group in this tree
    pub fn group_path(&self, group: &Group) -> String {
        ancestors::group_path(&self.root, group)
    }

    /// Canonical path of an entry in this tree
    pub fn entry_path(&self, entry: &Entry) -> String {
        ancestors::entry_path(&self.root, entry)
    }

    /// Parent group of a group, None for the root
    pub fn parent_of_group(&self, group: Uuid) -> Option<&Group> {
        parent_of(&self.root, NodeId::Group(group))
    }

    /// Parent group of an entry
    pub fn parent_of_entry(&self, entry: Uuid) -> Option<&Group> {
        parent_of(&self.root, NodeId::Entry(entry))
    }

    /// Recursive regex search from the cursor, producing canonical paths
    pub fn search(&self, pattern: &Regex) -> Vec<String> {
        crate::utils::search::search(&self.root, self.current(), pattern)
    }

    /// Create a subgroup under `parent`
    pub fn create_group(&mut self, parent: Uuid, name: &str) -> Result<Uuid> {
        let parent = self
            .root
            .find_group_mut(parent)
            .ok_or_else(|| Error::corrupted("parent group is not reachable from the root"))?;
        let uuid = parent.new_subgroup(name)?.uuid();
        debug!(group = name, "group created");
        self.changed = true;
        Ok(uuid)
    }

    /// Create an entry under `parent`
    pub fn create_entry(&mut self, parent: Uuid, title: &str) -> Result<Uuid> {
        let parent = self
            .root
            .find_group_mut(parent)
            .ok_or_else(|| Error::corrupted("parent group is not reachable from the root"))?;
        let uuid = parent.new_entry(title)?.uuid();
        debug!(entry = title, "entry created");
        self.changed = true;
        Ok(uuid)
    }

    /// Rename a group, rejecting sibling collisions
    pub fn rename_group(&mut self, group: Uuid, name: &str) -> Result<()> {
        if group == self.root.uuid() {
            return Err(Error::invalid_path("cannot rename the root group"));
        }
        let parent = self
            .parent_of_group(group)
            .ok_or_else(|| Error::corrupted("group has no findable ancestor chain"))?;
        if parent.groups().iter().any(|g| g.name() == name && g.uuid() != group) {
            return Err(Error::DuplicateName {
                name: name.to_string(),
            });
        }
        let target = self
            .root
            .find_group_mut(group)
            .ok_or_else(|| Error::corrupted("group vanished during rename"))?;
        target.set_name(name);
        self.changed = true;
        Ok(())
    }

    /// Retitle an entry, rejecting sibling collisions
    pub fn rename_entry(&mut self, entry: Uuid, title: &str) -> Result<()> {
        let parent = self
            .parent_of_entry(entry)
            .ok_or_else(|| Error::corrupted("entry has no findable ancestor chain"))?;
        if parent
            .entries()
            .iter()
            .any(|e| e.title() == title && e.uuid() != entry)
        {
            return Err(Error::DuplicateName {
                name: title.to_string(),
            });
        }
        let target = self
            .root
            .find_entry_mut(entry)
            .ok_or_else(|| Error::corrupted("entry vanished during rename"))?;
        target.set_title(title);
        self.changed = true;
        Ok(())
    }

    /// Replace an entry's value set wholesale
    pub fn set_entry_values(&mut self, entry: Uuid, values: Vec<Value>) -> Result<()> {
        let target = self
            .root
            .find_entry_mut(entry)
            .ok_or_else(|| Error::corrupted("entry is not reachable from the root"))?;
        target.set_values(values);
        self.changed = true;
        Ok(())
    }

    /// Record a read access on an entry
    pub fn touch_entry(&mut self, entry: Uuid) -> Result<()> {
        let target = self
            .root
            .find_entry_mut(entry)
            .ok_or_else(|| Error::corrupted("entry is not reachable from the root"))?;
        target.touch();
        self.changed = true;
        Ok(())
    }

    /// Remove a group and everything beneath it. The cursor falls back to
    /// the root when it pointed into the removed subtree.
    pub fn remove_group(&mut self, group: Uuid) -> Result<()> {
        if group == self.root.uuid() {
            return Err(Error::invalid_path("cannot remove the root group"));
        }
        let cursor_inside = self
            .root
            .find_group(group)
            .map(|g| g.find_group(self.current).is_some())
            .unwrap_or(false);
        let parent = self
            .parent_of_group(group)
            .ok_or_else(|| Error::corrupted("group has no findable ancestor chain"))?
            .uuid();
        self.root
            .find_group_mut(parent)
            .ok_or_else(|| Error::corrupted("parent group vanished during removal"))?
            .remove_subgroup(group)?;
        if cursor_inside {
            self.current = self.root.uuid();
        }
        debug!("group removed");
        self.changed = true;
        Ok(())
    }

    /// Remove a single entry
    pub fn remove_entry(&mut self, entry: Uuid) -> Result<()> {
        let parent = self
            .parent_of_entry(entry)
            .ok_or_else(|| Error::corrupted("entry has no findable ancestor chain"))?
            .uuid();
        self.root
            .find_group_mut(parent)
            .ok_or_else(|| Error::corrupted("parent group vanished during removal"))?
            .remove_entry(entry)?;
        debug!("entry removed");
        self.changed = true;
        Ok(())
    }

    /// Move an entry under a new parent group.
    ///
    /// Stage-then-commit: the entry is attached at the destination first
    /// and detached from its source only afterwards, so a failure in
    /// between can duplicate but never lose the node.
    pub fn move_entry(&mut self, entry: Uuid, new_parent: Uuid) -> Result<()> {
        let cloned = self
            .root
            .find_entry(entry)
            .cloned()
            .ok_or_else(|| Error::corrupted("entry is not reachable from the root"))?;
        let old_parent = self
            .parent_of_entry(entry)
            .ok_or_else(|| Error::corrupted("entry has no findable ancestor chain"))?
            .uuid();

        self.root
            .find_group_mut(new_parent)
            .ok_or_else(|| Error::corrupted("destination group is not reachable from the root"))?
            .add_entry(cloned)?;

        match self
            .root
            .find_group_mut(old_parent)
            .and_then(|g| g.detach_entry(entry))
        {
            Some(_) => {
                debug!("entry moved");
                self.changed = true;
                Ok(())
            }
            None => Err(Error::corrupted(
                "entry vanished from its source group during move",
            )),
        }
    }

    /// Move a group (and its subtree) under a new parent group.
    ///
    /// Moving a group beneath itself or one of its own descendants is
    /// rejected before anything is attached.
    pub fn move_group(&mut self, group: Uuid, new_parent: Uuid) -> Result<()> {
        if group == self.root.uuid() {
            return Err(Error::invalid_path("cannot move the root group"));
        }

        let (old_parent, cloned) = {
            let moving = self
                .root
                .find_group(group)
                .ok_or_else(|| Error::corrupted("group is not reachable from the root"))?;
            if moving.find_group(new_parent).is_some() {
                return Err(Error::invalid_path(
                    "cannot move a group beneath its own subtree",
                ));
            }
            let old_parent = self
                .parent_of_group(group)
                .ok_or_else(|| Error::corrupted("group has no findable ancestor chain"))?
                .uuid();
            (old_parent, moving.clone())
        };

        self.root
            .find_group_mut(new_parent)
            .ok_or_else(|| Error::corrupted("destination group is not reachable from the root"))?
            .add_subgroup(cloned)?;

        match self
            .root
            .find_group_mut(old_parent)
            .and_then(|g| g.detach_subgroup(group))
        {
            Some(_) => {
                debug!("group moved");
                self.changed = true;
                Ok(())
            }
            None => Err(Error::corrupted(
                "group vanished from its source during move",
            )),
        }
    }

    /// Persist the tree through the driver and clear the changed flag
    pub fn save(&mut self) -> Result<()> {
        self.backend.save(&self.root)?;
        self.changed = false;
        info!("store saved");
        Ok(())
    }

    /// Tear the session down, releasing the advisory lock. Unsaved changes
    /// are dropped; deciding whether to save first is the caller's job.
    pub fn close(mut self) -> Result<()> {
        self.backend.unlock()?;
        info!("store closed");
        Ok(())
    }
}
