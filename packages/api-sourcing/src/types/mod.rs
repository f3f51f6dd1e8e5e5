//! Data types for the sourcing pipeline.

pub mod config;
pub mod context;
pub mod record;
pub mod request;
pub mod response;
pub mod schema;

pub use config::{RequestsSpec, SourceOptions};
pub use context::SourceContext;
pub use record::EmittedRecord;
pub use request::{
    DataSource, EntryPoint, FetchOptions, HttpMethod, RequestConfig, RequestDescriptor,
    RequestSnapshot, SerializeStrategy,
};
pub use response::{FetchResponse, ResponseContext, SerializedContext};
pub use schema::{SchemaProvider, TypeSchema};
