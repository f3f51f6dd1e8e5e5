//! Emitted record shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A normalized, content-addressed record handed to the host store.
///
/// `id` and `content_digest` derive deterministically from the record's
/// normalized field map, so re-ingesting byte-identical upstream data
/// replaces equal records instead of duplicating them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmittedRecord {
    /// Globally-unique, deterministic id.
    pub id: String,

    /// Type tag, e.g. `ExternalRepo`.
    pub record_type: String,

    /// Normalized field map (keys satisfy the identifier grammar).
    pub fields: Map<String, Value>,

    /// Canonical JSON encoding of `fields`.
    pub content: String,

    /// Deterministic hash over `fields`.
    pub content_digest: String,

    /// Always `"application/json"`.
    pub media_type: String,
}

impl EmittedRecord {
    /// Media type attached to every record.
    pub const MEDIA_TYPE: &'static str = "application/json";
}
