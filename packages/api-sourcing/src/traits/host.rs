//! Host-provided collaborators.
//!
//! The pipeline never talks to the outside world directly: records go to a
//! [`RecordStore`], resolved request lists persist in a [`BuildCache`],
//! type definitions go to a [`TypeRegistry`], and all diagnostics flow
//! through a [`Reporter`]. The in-memory implementations in
//! [`crate::stores`] satisfy these for tests and development.

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::types::record::EmittedRecord;

/// Boxed error type for host-facing fallible operations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Destination for emitted records.
///
/// The pipeline calls [`RecordStore::create`] exactly once per record and
/// never updates or deletes. Identity is deterministic, so re-running over
/// identical upstream data replaces equal records instead of duplicating.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Allocate a globally-unique, deterministic id from a seed string.
    ///
    /// The same seed must always yield the same id.
    fn node_id(&self, seed: &str) -> String;

    /// Deterministic hash over a JSON value, used for record identity and
    /// change detection. The default is a SHA-256 hex digest of the
    /// canonical (key-sorted) JSON encoding.
    fn content_digest(&self, value: &Value) -> String {
        let canonical = serde_json::to_string(value).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Persist one record.
    async fn create(&self, record: EmittedRecord) -> Result<(), BoxError>;
}

/// Key/value store scoped to the host's build cache.
///
/// Values are JSON; the pipeline stores the serializable projection of its
/// resolved request list here so dynamic resolution runs at most once per
/// build-cache lifetime.
#[async_trait]
pub trait BuildCache: Send + Sync {
    /// Read a value by key. `Ok(None)` means the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Value>, BoxError>;

    /// Write a value by key.
    async fn set(&self, key: &str, value: Value) -> Result<(), BoxError>;
}

/// Receiver for type-schema definitions, independent of record emission.
pub trait TypeRegistry: Send + Sync {
    /// Register a type definition for a resolved request.
    fn create_types(&self, definition: &str) -> Result<(), BoxError>;
}

/// Diagnostic sink.
///
/// Only non-fatal diagnostics pass through here; fatal conditions surface
/// as `Err` returns from the pipeline so the host can abort its build.
pub trait Reporter: Send + Sync {
    /// Non-fatal problem worth the operator's attention.
    fn warn(&self, message: &str);

    /// Diagnostic detail, e.g. key renames.
    fn verbose(&self, message: &str);
}

/// Default reporter that forwards to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn verbose(&self, message: &str) {
        tracing::debug!("{message}");
    }
}
