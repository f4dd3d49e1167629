//! Local store format B: nested tree, no parent links
//!
//! The v2 container holds a single YAML document of the nested tree itself.
//! No record anywhere carries a parent pointer (ancestry is always derived
//! by traversal) and there is no database-level binaries pool; attachments
//! live inline as binary values on their entries.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::backup::write_with_backup;
use super::cipher;
use super::lock::LockFile;
use super::{Backend, BackendResult, StoreVersion};
use crate::models::{Group, Value};

/// The full v2 document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NestedDocument {
    root: Group,
}

/// Driver for the v2 nested-tree store
#[derive(Debug)]
pub struct NestedBackend {
    path: PathBuf,
    key: String,
    lock: LockFile,
    root: Group,
}

impl NestedBackend {
    /// Configure a driver for the store at `path`, sealed with `key`
    pub fn new<P: AsRef<Path>>(path: P, key: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            key: key.to_string(),
            lock: LockFile::for_store(path.as_ref()),
            root: Group::new_root(),
        }
    }

    fn write(&self) -> BackendResult<()> {
        let document = NestedDocument {
            root: self.root.clone(),
        };
        let yaml = serde_yaml::to_string(&document)?;
        let sealed = cipher::seal(&self.key, yaml.as_bytes())?;
        write_with_backup(&self.path, &sealed)
    }
}

impl Backend for NestedBackend {
    fn init(&mut self) -> BackendResult<()> {
        if self.path.exists() {
            let sealed = fs::read(&self.path)?;
            let yaml = cipher::open(&self.key, &sealed)?;
            let document: NestedDocument = serde_yaml::from_slice(&yaml)?;
            self.root = document.root;
            debug!(store = %self.path.display(), "opened v2 store");
        } else {
            self.root = Group::new_root();
            self.write()?;
            info!(store = %self.path.display(), "created new v2 store");
        }
        Ok(())
    }

    fn root(&self) -> BackendResult<Group> {
        Ok(self.root.clone())
    }

    fn save(&mut self, root: &Group) -> BackendResult<()> {
        self.root = root.clone();
        self.write()
    }

    fn version(&self) -> StoreVersion {
        StoreVersion::V2
    }

    /// The v2 format has no database-level binaries pool
    fn binary(&self, _id: u64, _name: &str) -> BackendResult<Option<Value>> {
        Ok(None)
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
