//! Typed field values for keytree entries
//!
//! A [`Value`] is one named field of an entry: a byte content, a kind
//! (string, long string or binary) and the searchable/protected/read-only
//! flags. Values are immutable once constructed; entries replace their
//! value set wholesale on update.

use serde::{Deserialize, Serialize};

/// Marker rendered in place of protected content.
pub const REDACTION_MARKER: &str = "[protected]";

/// Continuation prefix for embedded newlines in long-string values.
pub const CONTINUATION_PREFIX: &str = "    ";

/// Built-in value names in canonical rendering order.
///
/// Matching against these names is case-insensitive.
pub const STANDARD_VALUE_ORDER: [&str; 7] = [
    "Location",
    "Title",
    "URL",
    "UserName",
    "Password",
    "Notes",
    "Attachment",
];

/// Kinds of values that can be stored in an entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Single-line text
    String,

    /// Multi-line text (notes and similar)
    LongString,

    /// Raw binary content (attachments)
    Binary,
}

impl ValueKind {
    /// Get the display name for this value kind
    pub fn display_name(&self) -> &'static str {
        match self {
            ValueKind::String => "String",
            ValueKind::LongString => "Long String",
            ValueKind::Binary => "Binary",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One named, typed field of an entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Value {
    /// Field name; built-in names match case-insensitively
    name: String,

    /// Raw byte content
    #[serde(with = "content_encoding")]
    content: Vec<u8>,

    /// The value kind (determines rendering)
    kind: ValueKind,

    /// Whether search may inspect this value's content
    searchable: bool,

    /// Whether the content must be redacted in non-full output
    protected: bool,

    /// Whether the value may be replaced by the user
    read_only: bool,
}

impl Value {
    /// Create a plain string value (searchable, not protected)
    pub fn string<N, C>(name: N, content: C) -> Self
    where
        N: Into<String>,
        C: Into<String>,
    {
        Self {
            name: name.into(),
            content: content.into().into_bytes(),
            kind: ValueKind::String,
            searchable: true,
            protected: false,
            read_only: false,
        }
    }

    /// Create a multi-line string value (searchable, not protected)
    pub fn long_string<N, C>(name: N, content: C) -> Self
    where
        N: Into<String>,
        C: Into<String>,
    {
        Self {
            name: name.into(),
            content: content.into().into_bytes(),
            kind: ValueKind::LongString,
            searchable: true,
            protected: false,
            read_only: false,
        }
    }

    /// Create a binary value (not searchable, not protected)
    pub fn binary<N>(name: N, content: Vec<u8>) -> Self
    where
        N: Into<String>,
    {
        Self {
            name: name.into(),
            content,
            kind: ValueKind::Binary,
            searchable: false,
            protected: false,
            read_only: false,
        }
    }

    /// Create a password value.
    ///
    /// Passwords are protected and never searchable, independent of their
    /// literal content.
    pub fn password<C: Into<String>>(content: C) -> Self {
        Self {
            name: "Password".to_string(),
            content: content.into().into_bytes(),
            kind: ValueKind::String,
            searchable: false,
            protected: true,
            read_only: false,
        }
    }

    /// Override the searchable flag
    pub fn with_searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// Override the protected flag
    pub fn with_protected(mut self, protected: bool) -> Self {
        self.protected = protected;
        self
    }

    /// Mark the value read-only
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// The field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw byte content
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// The content interpreted as UTF-8 text
    pub fn content_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// The value kind
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether this value's name matches `name`, ignoring ASCII case
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// The content as it appears in output and to the search engine.
    ///
    /// Binary content is summarized by size and never rendered inline.
    pub fn format_content(&self) -> String {
        match self.kind {
            ValueKind::Binary => format!("<{} bytes>", self.content.len()),
            _ => self.content_str().into_owned(),
        }
    }

    /// Render this value as a single output block.
    ///
    /// With `full == false` protected content is replaced by
    /// [`REDACTION_MARKER`]. Long strings start on a fresh line and every
    /// embedded newline gets a continuation prefix.
    pub fn format(&self, full: bool) -> String {
        if self.protected && !full {
            return format!("{}: {}", self.name, REDACTION_MARKER);
        }

        match self.kind {
            ValueKind::Binary => format!("{}: {}", self.name, self.format_content()),
            ValueKind::LongString => {
                let body = self.content_str().replace('\n', &format!("\n{CONTINUATION_PREFIX}"));
                format!("{}:\n{}{}", self.name, CONTINUATION_PREFIX, body)
            }
            ValueKind::String => format!("{}: {}", self.name, self.content_str()),
        }
    }
}

/// Serde helper encoding byte content as base64 strings so the YAML
/// documents stay compact and text-safe.
pub(crate) mod content_encoding {
    use base64::prelude::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64_STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64_STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_value_defaults() {
        let value = Value::string("UserName", "bob");
        assert_eq!(value.name(), "UserName");
        assert_eq!(value.content_str(), "bob");
        assert_eq!(value.kind(), ValueKind::String);
        assert!(value.is_searchable());
        assert!(!value.is_protected());
        assert!(!value.is_read_only());
    }

    #[test]
    fn test_password_flags() {
        let value = Value::password("secret");
        assert!(value.is_protected());
        assert!(!value.is_searchable());
        assert_eq!(value.format(false), "Password: [protected]");
        assert_eq!(value.format(true), "Password: secret");
    }

    #[test]
    fn test_case_insensitive_name_match() {
        let value = Value::string("URL", "github.com");
        assert!(value.name_matches("url"));
        assert!(value.name_matches("Url"));
        assert!(!value.name_matches("username"));
    }

    #[test]
    fn test_binary_renders_size_only() {
        let value = Value::binary("Attachment", vec![0u8; 42]);
        assert_eq!(value.format_content(), "<42 bytes>");
        assert_eq!(value.format(true), "Attachment: <42 bytes>");
        assert!(!value.format(true).contains('\0'));
    }

    #[test]
    fn test_long_string_continuation() {
        let value = Value::long_string("Notes", "line one\nline two");
        let rendered = value.format(true);
        assert_eq!(rendered, "Notes:\n    line one\n    line two");
    }

    #[test]
    fn test_protected_long_string_redacted() {
        let value = Value::long_string("Notes", "a\nb").with_protected(true);
        assert_eq!(value.format(false), "Notes: [protected]");
    }

    #[test]
    fn test_builder_overrides() {
        let value = Value::string("PIN", "1234")
            .with_protected(true)
            .with_searchable(false)
            .with_read_only(true);
        assert!(value.is_protected());
        assert!(!value.is_searchable());
        assert!(value.is_read_only());
    }

    #[test]
    fn test_content_yaml_round_trip() {
        let value = Value::binary("Attachment", vec![1, 2, 3, 255]);
        let yaml = serde_yaml::to_string(&value).unwrap();
        let back: Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, value);
        // Raw bytes never land in the document verbatim.
        assert!(!yaml.contains('\u{ff}'));
    }
}
