//! KeyTree Core Library
//!
//! This crate is the backend-abstraction core of keytree: filesystem-style
//! navigation, mutation and search over hierarchical credential stores. It
//! models the tree (groups, entries, named values), reconstructs ancestry
//! without parent pointers, resolves slash-separated paths against a
//! current-location cursor, and hides three structurally different stores
//! behind one driver contract.
//!
//! # Features
//!
//! - **Data Models**: groups, entries and typed values with stable UUIDs
//! - **Ancestor Reconstruction**: parent chains derived by traversal, never
//!   stored
//! - **Path Resolution**: relative/absolute paths with `..` and positional
//!   indexes
//! - **Search**: recursive regex search producing canonical paths
//! - **Drivers**: two local encrypted container formats and a remote vault
//!   adapter behind the [`backend::Backend`] trait
//!
//! # Usage
//!
//! ```rust
//! use keytree_core::backend::NestedBackend;
//! use keytree_core::Database;
//!
//! # fn demo() -> keytree_core::Result<()> {
//! let backend = NestedBackend::new("/tmp/demo.ktree", "master key");
//! let mut db = Database::open(Box::new(backend), false)?;
//!
//! let root = db.root().uuid();
//! let work = db.create_group(root, "Work")?;
//! db.create_entry(work, "GitHub")?;
//!
//! let (group, entry) = db.resolve("Work/GitHub")?;
//! assert_eq!(group.name(), "Work");
//! assert!(entry.is_some());
//!
//! db.save()?;
//! db.close()?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod core;
pub mod logging;
pub mod models;
pub mod utils;

// Re-export commonly used types for convenience
pub use models::{Entry, Group, Value, ValueKind};

pub use crate::core::{Database, Error, NodeId, Result};

pub use backend::{Backend, BackendError, BackendResult, StoreVersion};

pub use config::{open_backend, ConfigError, StoreConfig};

/// Library version, from the crate manifest
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
