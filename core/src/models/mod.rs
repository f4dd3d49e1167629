//! Shared data models for keytree
//!
//! This module contains the node types of the credential tree: typed field
//! values, entry records and group containers. These are the records the
//! core exchanges with backend drivers; the drivers own every on-disk and
//! on-wire detail.

pub mod entry;
pub mod group;
pub mod value;

pub use entry::Entry;
pub use group::Group;
pub use value::{Value, ValueKind, CONTINUATION_PREFIX, REDACTION_MARKER, STANDARD_VALUE_ORDER};
