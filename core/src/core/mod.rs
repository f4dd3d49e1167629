//! Core store logic: errors, ancestor reconstruction, path resolution and
//! the database session object.

pub mod ancestors;
pub mod database;
pub mod errors;
pub mod resolver;

pub use ancestors::{entry_path, find_ancestors, group_path, parent_of, NodeId};
pub use database::Database;
pub use errors::{Error, Result};
pub use resolver::resolve;
