//! Entry records for keytree
//!
//! An [`Entry`] is a leaf node of the credential tree: a stable UUID, an
//! ordered set of [`Value`]s and a handful of timestamps. Entries carry no
//! parent pointer; the parent is derived by walking the tree from the root
//! (see [`crate::core::ancestors`]).

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value::{Value, STANDARD_VALUE_ORDER};

/// A leaf node holding a set of named values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    /// Stable identity, assigned once
    uuid: Uuid,

    /// Ordered value set, replaced wholesale on update
    values: Vec<Value>,

    /// When this entry was created
    created: DateTime<Utc>,

    /// When the value set was last replaced
    modified: DateTime<Utc>,

    /// When this entry was last read
    accessed: DateTime<Utc>,

    /// Optional expiry time
    expiry: Option<DateTime<Utc>>,
}

impl Entry {
    /// Create a new entry with a generated UUID and the given title
    pub fn new<S: Into<String>>(title: S) -> Self {
        let now = Utc::now();
        Self {
            uuid: Uuid::new_v4(),
            values: vec![Value::string("Title", title)],
            created: now,
            modified: now,
            accessed: now,
            expiry: None,
        }
    }

    /// Reassemble an entry from parts a backend driver loaded, preserving
    /// the stored identity
    pub(crate) fn from_parts(uuid: Uuid, values: Vec<Value>) -> Self {
        let now = Utc::now();
        Self {
            uuid,
            values,
            created: now,
            modified: now,
            accessed: now,
            expiry: None,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// The UUID in canonical hyphenated string form
    pub fn uuid_string(&self) -> String {
        self.uuid.to_string()
    }

    /// The entry title (content of the built-in `Title` value)
    pub fn title(&self) -> String {
        self.value("Title")
            .map(|v| v.content_str().into_owned())
            .unwrap_or_default()
    }

    /// Ordered values; ordering is stable absent mutation
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Look up a value by name, ignoring ASCII case
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|v| v.name_matches(name))
    }

    /// Replace the whole value set and bump the modification time
    pub fn set_values(&mut self, values: Vec<Value>) {
        self.values = values;
        self.modified = Utc::now();
    }

    /// Replace the title value, keeping everything else untouched
    pub fn set_title<S: Into<String>>(&mut self, title: S) {
        let title = Value::string("Title", title);
        match self.values.iter_mut().find(|v| v.name_matches("Title")) {
            Some(slot) => *slot = title,
            None => self.values.insert(0, title),
        }
        self.modified = Utc::now();
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    pub fn accessed(&self) -> DateTime<Utc> {
        self.accessed
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }

    pub fn set_expiry(&mut self, expiry: Option<DateTime<Utc>>) {
        self.expiry = expiry;
        self.modified = Utc::now();
    }

    /// Record a read access
    pub fn touch(&mut self) {
        self.accessed = Utc::now();
    }

    /// Render all values in canonical order.
    ///
    /// Built-in values come first in the fixed order location, title, url,
    /// username, password, notes, attachment; any remaining values follow in
    /// stored order. With `full == false` protected values are redacted.
    pub fn format(&self, full: bool) -> String {
        let mut lines = Vec::with_capacity(self.values.len());

        for name in STANDARD_VALUE_ORDER {
            if let Some(value) = self.value(name) {
                lines.push(value.format(full));
            }
        }

        for value in &self.values {
            let builtin = STANDARD_VALUE_ORDER
                .iter()
                .any(|name| value.name_matches(name));
            if !builtin {
                lines.push(value.format(full));
            }
        }

        lines.join("\n")
    }

    /// Whether any searchable value's formatted content matches `pattern`.
    ///
    /// Values flagged not-searchable are skipped unconditionally and can
    /// never produce a match.
    pub fn matches(&self, pattern: &Regex) -> bool {
        self.values
            .iter()
            .filter(|v| v.is_searchable())
            .any(|v| pattern.is_match(&v.format_content()))
    }
}
