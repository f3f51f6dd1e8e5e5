//! Typed errors for the sourcing pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Each pipeline phase owns its
//! error enum; `SourceError` is the umbrella the orchestrator surfaces.

use thiserror::Error;

/// Errors that abort the sourcing run for one plugin instance.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Invalid or contradictory configuration, caught pre-flight
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Operator-supplied request provider failed
    #[error("resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// A critical request failed to fetch
    #[error("fetch error for request `{name}`: {source}")]
    Fetch {
        /// Name of the failing request
        name: String,
        #[source]
        source: FetchError,
    },

    /// Serialization failed (custom or aggregate serializer)
    #[error("serialization error: {0}")]
    Serialize(#[from] SerializeError),

    /// Build cache read failed
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Host record store rejected a record
    #[error("record store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Host type registry rejected a schema definition
    #[error("type registry error: {0}")]
    Schema(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Invalid request configuration. Fatal before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Request name is empty or missing
    #[error("request name must be a non-empty string")]
    MissingName,

    /// Request name collides with a reserved record field
    #[error("request name `{name}` is reserved")]
    ReservedName { name: String },

    /// One or more fields failed validation
    #[error("invalid request configuration for `{name}`: {}", problems.join("; "))]
    Invalid {
        /// Name of the offending request
        name: String,
        /// One message per offending field
        problems: Vec<String>,
    },
}

/// Operator-supplied request provider failed. Fatal, never retried.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A `ResolveRequest`/`ResolveRequests` implementation returned an error
    #[error("request provider failed: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from executing one fetch. Escalation is governed by the
/// request's `kill_on_request_error` flag.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No endpoint derivable for a built-in HTTP fetch
    #[error("an endpoint must be specified for request `{name}`")]
    MissingEndpoint { name: String },

    /// Network-level failure after retries exhausted
    #[error("HTTP request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Non-success status after retries exhausted
    #[error("HTTP {status} from {endpoint}")]
    Status { status: u16, endpoint: String },

    /// Response body was not valid JSON
    #[error("invalid JSON from {endpoint}: {source}")]
    Json {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A custom fetcher returned an error
    #[error("custom fetch failed: {0}")]
    Custom(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A custom fetcher returned no data
    #[error("custom fetch returned no data")]
    Empty,
}

/// Errors from serializing a response.
///
/// A missing entry point is a warning, not an error; only custom and
/// aggregate serializers can fail fatally.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// A custom serializer returned an error
    #[error("custom serializer failed for request `{name}`: {source}")]
    Custom {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The aggregate serializer returned an error
    #[error("serialize_all failed: {0}")]
    Aggregate(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from the host build cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Cache read failed (fatal: the host cache is required infrastructure)
    #[error("unable to read request list from build cache key `{key}`: {source}")]
    Read {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Cache write failed (warned, not fatal)
    #[error("unable to write request list to build cache key `{key}`: {source}")]
    Write {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Cached value did not decode as a request snapshot list
    #[error("corrupt cache entry at key `{key}`: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for serialization.
pub type SerializeResult<T> = std::result::Result<T, SerializeError>;
