//! Core trait abstractions.
//!
//! Two families live here: the extension points an operator can plug into
//! the pipeline ([`Fetcher`], [`Serializer`], [`SerializeAll`],
//! [`ResolveRequest`], [`ResolveRequests`]), and the host interfaces the
//! surrounding build system must provide ([`RecordStore`], [`BuildCache`],
//! [`TypeRegistry`], [`Reporter`]).

pub mod fetcher;
pub mod host;
pub mod resolver;
pub mod serializer;

pub use fetcher::Fetcher;
pub use host::{BuildCache, RecordStore, Reporter, TracingReporter, TypeRegistry};
pub use resolver::{ResolveRequest, ResolveRequests};
pub use serializer::{SerializeAll, Serializer};
