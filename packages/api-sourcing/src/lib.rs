//! HTTP API sourcing pipeline for static-site builds.
//!
//! Declares one or more requests against external HTTP APIs, resolves the
//! declarations into concrete fetch operations, executes them
//! concurrently, extracts the interesting payload, sanitizes field names,
//! and emits deterministic, content-addressed records to a host store.
//!
//! # Design
//!
//! - Declarative requests, pluggable behavior: custom fetchers,
//!   serializers, and dynamic request providers are trait objects, so the
//!   "exactly one strategy" rules hold by construction.
//! - Degrade, don't cascade: each request carries its own failure policy;
//!   one bad upstream only aborts the build when configured as critical.
//! - Deterministic identity: record ids and digests derive from the
//!   normalized payload, so re-ingesting identical data replaces records
//!   instead of duplicating them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use api_sourcing::{Pipeline, RequestConfig, SourceOptions};
//! use api_sourcing::stores::MemoryStore;
//! use api_sourcing::traits::TracingReporter;
//!
//! let options = SourceOptions::new("github").with_requests(vec![
//!     RequestConfig::named("repos")
//!         .with_endpoint("https://api.github.com/users/octocat/repos".parse()?)
//!         .with_entry_point("data.items"),
//! ]);
//!
//! let store = Arc::new(MemoryStore::new());
//! let pipeline = Pipeline::new(options, store.clone(), store.clone(), Arc::new(TracingReporter));
//! pipeline.init().await?;
//! let summary = pipeline.source().await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Extension points and host interfaces
//! - [`types`] - Request, response, and record types
//! - [`pipeline`] - Resolution, fetch fan-out, serialization, materialization
//! - [`fetchers`] - Built-in HTTP fetch and a mock
//! - [`stores`] - In-memory host implementation
//! - [`keys`] - Field-name sanitization
//! - [`testing`] - Test doubles

pub mod error;
pub mod fetchers;
pub mod keys;
pub mod merge;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    CacheError, ConfigError, FetchError, ResolveError, Result, SerializeError, SourceError,
};
pub use traits::{
    BuildCache, Fetcher, RecordStore, Reporter, ResolveRequest, ResolveRequests, SerializeAll,
    Serializer, TracingReporter, TypeRegistry,
};
pub use types::{
    EmittedRecord, EntryPoint, FetchOptions, FetchResponse, HttpMethod, RequestConfig,
    RequestDescriptor, RequestsSpec, ResponseContext, SourceContext, SourceOptions, TypeSchema,
};

// Re-export the orchestrator and fetchers
pub use fetchers::{HttpFetcher, MockFetcher};
pub use pipeline::{Pipeline, SourceSummary};
pub use stores::MemoryStore;

// Key sanitization at the crate root, it is the most commonly reused leaf
pub use keys::normalize_key;
