//! Instance-level configuration.

use std::fmt;
use std::sync::Arc;

use crate::traits::resolver::{ResolveRequest, ResolveRequests};
use crate::traits::serializer::SerializeAll;
use crate::types::request::RequestConfig;

/// How the request list for an instance is specified.
///
/// The variants are mutually exclusive by construction; the runtime
/// property-probing of loosely-typed plugin configs becomes a tagged enum.
#[derive(Clone, Default)]
pub enum RequestsSpec {
    /// The instance options themselves describe the single request.
    #[default]
    Options,

    /// A static request list, used as-is.
    Static(Vec<RequestConfig>),

    /// A provider computing one request at build time.
    Dynamic(Arc<dyn ResolveRequest>),

    /// A provider computing the whole list at build time.
    DynamicList(Arc<dyn ResolveRequests>),
}

impl fmt::Debug for RequestsSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestsSpec::Options => write!(f, "Options"),
            RequestsSpec::Static(requests) => {
                f.debug_tuple("Static").field(&requests.len()).finish()
            }
            RequestsSpec::Dynamic(_) => write!(f, "Dynamic"),
            RequestsSpec::DynamicList(_) => write!(f, "DynamicList"),
        }
    }
}

/// Configuration for one pipeline instance.
///
/// `defaults` carries the instance-wide request fields; every resolved
/// request merges them under its own overrides. In the default
/// [`RequestsSpec::Options`] mode the defaults themselves become the
/// single request, named after the instance.
#[derive(Clone)]
pub struct SourceOptions {
    /// Unique instance name.
    pub name: String,

    /// Instance-wide request defaults.
    pub defaults: RequestConfig,

    /// Where the request list comes from.
    pub requests: RequestsSpec,

    /// Aggregate serializer combining all responses into one payload.
    pub serialize_all: Option<Arc<dyn SerializeAll>>,
}

impl SourceOptions {
    /// Create options for a named instance.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defaults: RequestConfig::new(),
            requests: RequestsSpec::Options,
            serialize_all: None,
        }
    }

    /// Set the instance-wide request defaults.
    pub fn with_defaults(mut self, defaults: RequestConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Use a static request list.
    pub fn with_requests(mut self, requests: Vec<RequestConfig>) -> Self {
        self.requests = RequestsSpec::Static(requests);
        self
    }

    /// Use a dynamic single-request provider.
    pub fn with_request_provider(mut self, provider: Arc<dyn ResolveRequest>) -> Self {
        self.requests = RequestsSpec::Dynamic(provider);
        self
    }

    /// Use a dynamic request-list provider.
    pub fn with_requests_provider(mut self, provider: Arc<dyn ResolveRequests>) -> Self {
        self.requests = RequestsSpec::DynamicList(provider);
        self
    }

    /// Set the aggregate serializer.
    pub fn with_serialize_all(mut self, serialize_all: Arc<dyn SerializeAll>) -> Self {
        self.serialize_all = Some(serialize_all);
        self
    }

    /// The synthetic request config representing the instance itself,
    /// used in [`RequestsSpec::Options`] mode and for the aggregate
    /// serialization result.
    pub fn as_request(&self) -> RequestConfig {
        let mut request = self.defaults.clone();
        request.name = Some(self.name.clone());
        request
    }
}

impl fmt::Debug for SourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceOptions")
            .field("name", &self.name)
            .field("defaults", &self.defaults)
            .field("requests", &self.requests)
            .field("serialize_all", &self.serialize_all.is_some())
            .finish()
    }
}
