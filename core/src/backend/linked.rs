//! Local store format A: flat records with explicit parent links
//!
//! The v1 container holds a YAML document of flat group and entry records,
//! each group carrying an explicit link to its parent, plus a database-level
//! pool of binary attachments. The document is sealed with the container
//! framing from [`super::cipher`] and guarded by an advisory lock file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::backup::write_with_backup;
use super::cipher;
use super::lock::LockFile;
use super::{Backend, BackendError, BackendResult, StoreVersion};
use crate::models::{value::content_encoding, Entry, Group, Value};

/// One group row; the root row has no parent and an empty name
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GroupRecord {
    uuid: Uuid,
    parent: Option<Uuid>,
    name: String,
}

/// One entry row, linked to its owning group
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryRecord {
    group: Uuid,
    entry: Entry,
}

/// One attachment in the database-level binaries pool
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinaryRecord {
    id: u64,
    name: String,
    #[serde(with = "content_encoding")]
    data: Vec<u8>,
}

/// The full v1 document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LinkedDocument {
    groups: Vec<GroupRecord>,
    entries: Vec<EntryRecord>,
    #[serde(default)]
    binaries: Vec<BinaryRecord>,
}

/// Driver for the v1 linked-records store
#[derive(Debug)]
pub struct LinkedBackend {
    path: PathBuf,
    key: String,
    lock: LockFile,
    document: LinkedDocument,
}

impl LinkedBackend {
    /// Configure a driver for the store at `path`, sealed with `key`
    pub fn new<P: AsRef<Path>>(path: P, key: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            key: key.to_string(),
            lock: LockFile::for_store(path.as_ref()),
            document: LinkedDocument::default(),
        }
    }

    fn flatten(root: &Group, binaries: Vec<BinaryRecord>) -> LinkedDocument {
        let mut document = LinkedDocument {
            binaries,
            ..LinkedDocument::default()
        };
        Self::flatten_group(root, None, &mut document);
        document
    }

    fn flatten_group(group: &Group, parent: Option<Uuid>, document: &mut LinkedDocument) {
        document.groups.push(GroupRecord {
            uuid: group.uuid(),
            parent,
            name: group.name().to_string(),
        });
        for entry in group.entries() {
            document.entries.push(EntryRecord {
                group: group.uuid(),
                entry: entry.clone(),
            });
        }
        for child in group.groups() {
            Self::flatten_group(child, Some(group.uuid()), document);
        }
    }

    fn rebuild(document: &LinkedDocument) -> BackendResult<Group> {
        let root_record = document
            .groups
            .iter()
            .find(|g| g.parent.is_none())
            .ok_or_else(|| BackendError::BadContainer {
                message: "document has no root record".to_string(),
            })?;
        Ok(Self::rebuild_group(root_record, true, document))
    }

    fn rebuild_group(record: &GroupRecord, root: bool, document: &LinkedDocument) -> Group {
        // Sibling order is the record order in the document.
        let entries: Vec<Entry> = document
            .entries
            .iter()
            .filter(|e| e.group == record.uuid)
            .map(|e| e.entry.clone())
            .collect();
        let groups: Vec<Group> = document
            .groups
            .iter()
            .filter(|g| g.parent == Some(record.uuid))
            .map(|g| Self::rebuild_group(g, false, document))
            .collect();
        Group::from_parts(record.uuid, record.name.clone(), root, groups, entries)
    }

    fn write(&self) -> BackendResult<()> {
        let yaml = serde_yaml::to_string(&self.document)?;
        let sealed = cipher::seal(&self.key, yaml.as_bytes())?;
        write_with_backup(&self.path, &sealed)
    }
}

impl Backend for LinkedBackend {
    fn init(&mut self) -> BackendResult<()> {
        if self.path.exists() {
            let sealed = fs::read(&self.path)?;
            let yaml = cipher::open(&self.key, &sealed)?;
            self.document = serde_yaml::from_slice(&yaml)?;
            debug!(store = %self.path.display(), "opened v1 store");
        } else {
            self.document = Self::flatten(&Group::new_root(), Vec::new());
            self.write()?;
            info!(store = %self.path.display(), "created new v1 store");
        }
        Ok(())
    }

    fn root(&self) -> BackendResult<Group> {
        Self::rebuild(&self.document)
    }

    fn save(&mut self, root: &Group) -> BackendResult<()> {
        let binaries = std::mem::take(&mut self.document.binaries);
        self.document = Self::flatten(root, binaries);
        self.write()
    }

    fn version(&self) -> StoreVersion {
        StoreVersion::V1
    }

    fn binary(&self, id: u64, name: &str) -> BackendResult<Option<Value>> {
        Ok(self
            .document
            .binaries
            .iter()
            .find(|b| b.id == id)
            .map(|b| Value::binary(name, b.data.clone())))
    }

    fn lock(&mut self, force: bool) -> BackendResult<()> {
        if force {
            self.lock.acquire_forced()
        } else {
            self.lock.acquire()
        }
    }

    fn unlock(&mut self) -> BackendResult<()> {
        self.lock.release()
    }

    fn locked(&self) -> bool {
        self.lock.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_root() -> Group {
        let mut root = Group::new_root();
        let work = root.new_subgroup("Work").unwrap();
        work.new_entry("GitHub").unwrap();
        let dev = work.new_subgroup("Dev").unwrap();
        dev.new_entry("CI").unwrap();
        root
    }

    fn open_store(dir: &TempDir) -> LinkedBackend {
        let mut backend = LinkedBackend::new(dir.path().join("store.ktree"), "master");
        backend.init().unwrap();
        backend
    }

    #[test]
    fn test_init_creates_empty_store() {
        let dir = TempDir::new().unwrap();
        let backend = open_store(&dir);
        let root = backend.root().unwrap();
        assert!(root.is_root());
        assert!(root.groups().is_empty());
        assert!(dir.path().join("store.ktree").exists());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut backend = open_store(&dir);
        let root = sample_root();
        backend.save(&root).unwrap();

        let mut reopened = LinkedBackend::new(dir.path().join("store.ktree"), "master");
        reopened.init().unwrap();
        let loaded = reopened.root().unwrap();
        assert_eq!(loaded, root);
    }

    #[test]
    fn test_wrong_key_fails_open() {
        let dir = TempDir::new().unwrap();
        let mut backend = open_store(&dir);
        backend.save(&sample_root()).unwrap();

        let mut wrong = LinkedBackend::new(dir.path().join("store.ktree"), "other");
        let err = wrong.init().unwrap_err();
        assert!(matches!(err, BackendError::BadContainer { .. }));
    }

    #[test]
    fn test_parent_links_survive_flatten() {
        let root = sample_root();
        let document = LinkedBackend::flatten(&root, Vec::new());

        let root_record = document.groups.iter().find(|g| g.parent.is_none()).unwrap();
        let work = document.groups.iter().find(|g| g.name == "Work").unwrap();
        let dev = document.groups.iter().find(|g| g.name == "Dev").unwrap();
        assert_eq!(work.parent, Some(root_record.uuid));
        assert_eq!(dev.parent, Some(work.uuid));
    }

    #[test]
    fn test_binary_pool_lookup() {
        let dir = TempDir::new().unwrap();
        let mut backend = open_store(&dir);
        backend.document.binaries.push(BinaryRecord {
            id: 7,
            name: "report.pdf".to_string(),
            data: vec![1, 2, 3],
        });

        let value = backend.binary(7, "Attachment").unwrap().unwrap();
        assert_eq!(value.name(), "Attachment");
        assert_eq!(value.content(), &[1, 2, 3]);

        assert!(backend.binary(8, "Attachment").unwrap().is_none());
    }

    #[test]
    fn test_version_and_lock() {
        let dir = TempDir::new().unwrap();
        let mut backend = open_store(&dir);
        assert_eq!(backend.version(), StoreVersion::V1);

        assert!(!backend.locked());
        backend.lock(false).unwrap();
        assert!(backend.locked());
        backend.unlock().unwrap();
        assert!(!backend.locked());
    }
}
