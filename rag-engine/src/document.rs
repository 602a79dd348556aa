//! Data types for documents, metadata, and search results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordinal position of a document in the store.
///
/// Ids are assigned sequentially on insert and never reused while the
/// store holds data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub usize);

impl DocumentId {
    /// Return the position of this document in the store.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for DocumentId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// A scalar metadata value.
///
/// Restricted to strings, numbers, and booleans so that the snapshot format
/// round-trips exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// A boolean flag.
    Bool(bool),
    /// A numeric value.
    Number(f64),
    /// A UTF-8 string.
    String(String),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Key-value metadata attached to a document. Ordered so snapshots are stable.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A stored document: text, its embedding, and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Position of the document in the store.
    pub id: DocumentId,
    /// The text content of the document.
    pub text: String,
    /// The vector embedding for this document's text.
    pub embedding: Vec<f32>,
    /// Key-value metadata associated with the document.
    pub metadata: Metadata,
}

/// A retrieved [`Document`] paired with its distance from the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    /// The retrieved document.
    pub document: Document,
    /// Squared Euclidean distance to the query (lower is more relevant).
    pub distance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_values_serialize_untagged() {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), "line".into());
        metadata.insert("page".into(), 3i64.into());
        metadata.insert("pinned".into(), true.into());

        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(json, r#"{"page":3.0,"pinned":true,"source":"line"}"#);

        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }

    #[test]
    fn integer_json_numbers_parse_as_numbers() {
        let back: Metadata = serde_json::from_str(r#"{"page":3}"#).unwrap();
        assert_eq!(back.get("page"), Some(&MetadataValue::Number(3.0)));
    }
}
