//! Backend drivers for keytree stores
//!
//! Three structurally different stores hide behind one capability contract:
//! a local encrypted container of flat records with explicit parent links
//! ([`linked`]), a local encrypted container of the nested tree with no
//! parent links at all ([`nested`]), and a remote vault service with a flat
//! two-level model ([`remote`]). The core exchanges only group, entry and
//! value records with a driver, never raw bytes of the store.

pub mod backup;
pub mod cipher;
pub mod linked;
pub mod lock;
pub mod nested;
pub mod remote;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Group, Value};

pub use backup::BackupGuard;
pub use linked::LinkedBackend;
pub use lock::LockFile;
pub use nested::NestedBackend;
pub use remote::{
    MemoryRemoteClient, RemoteBackend, RemoteClient, RemoteField, RemoteItem, RemoteItemSummary,
    RemoteVaultInfo,
};

/// Store format implemented by a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreVersion {
    /// Local container, flat records with explicit parent links
    V1,
    /// Local container, nested tree without parent links
    V2,
    /// Remote vault service, flat two-level model
    Remote,
}

impl StoreVersion {
    pub fn display_name(&self) -> &'static str {
        match self {
            StoreVersion::V1 => "local store (v1, linked records)",
            StoreVersion::V2 => "local store (v2, nested tree)",
            StoreVersion::Remote => "remote vault",
        }
    }
}

impl std::fmt::Display for StoreVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Driver-layer errors
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),

    #[error("encryption failed: {message}")]
    Crypto { message: String },

    #[error("invalid key or corrupted container: {message}")]
    BadContainer { message: String },

    #[error("advisory lock already held (lock file: {path})")]
    LockHeld { path: String },

    #[error("unsupported structure for this store format: {message}")]
    Unsupported { message: String },

    #[error("remote vault error: {message}")]
    Remote { message: String },
}

/// Result type for driver operations
pub type BackendResult<T> = Result<T, BackendError>;

/// The capability contract every store driver implements.
///
/// Drivers are synchronous from the core's point of view: every call either
/// returns a result or an error, and a driver that talks to a network
/// service owns its own deadlines.
pub trait Backend {
    /// Open the store at the configured location, or create a new, empty
    /// one if nothing exists there yet
    fn init(&mut self) -> BackendResult<()>;

    /// Produce the current tree as group/entry/value records
    fn root(&self) -> BackendResult<Group>;

    /// Persist the tree.
    ///
    /// On write failure the driver attempts to restore the pre-write backup
    /// snapshot before returning the error; the snapshot is removed only
    /// after a confirmed-successful write.
    fn save(&mut self, root: &Group) -> BackendResult<()>;

    /// The store format this driver speaks
    fn version(&self) -> StoreVersion;

    /// Look up an out-of-band binary attachment by pool id and name.
    ///
    /// Stores that cannot associate database-level binaries report absence
    /// with `Ok(None)` rather than an error.
    fn binary(&self, id: u64, name: &str) -> BackendResult<Option<Value>>;

    /// Take the advisory lock. Purely advisory: a sentinel marker file
    /// colocated with the store, never enforced against a second process.
    ///
    /// With `force` the marker is taken even when one is already present;
    /// this is the human-override path after a stale or contested lock.
    fn lock(&mut self, force: bool) -> BackendResult<()>;

    /// Release the advisory lock
    fn unlock(&mut self) -> BackendResult<()>;

    /// Whether an advisory lock marker is currently present
    fn locked(&self) -> bool;
}
