//! Testing utilities.
//!
//! Test doubles for the host interfaces and the operator extension
//! points, useful for exercising the pipeline without network access.
//! [`crate::fetchers::MockFetcher`] and [`crate::stores::MemoryStore`]
//! complete the set.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::traits::host::{BoxError, Reporter};
use crate::traits::resolver::{ResolveRequest, ResolveRequests};
use crate::traits::serializer::SerializeAll;
use crate::types::config::SourceOptions;
use crate::types::context::SourceContext;
use crate::types::request::RequestConfig;
use crate::types::response::ResponseContext;

/// Reporter that records every message for assertions.
#[derive(Default)]
pub struct CollectingReporter {
    warnings: RwLock<Vec<String>>,
    verbose: RwLock<Vec<String>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings emitted so far, in order.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.read().unwrap().clone()
    }

    /// Verbose diagnostics emitted so far, in order.
    pub fn verbose_messages(&self) -> Vec<String> {
        self.verbose.read().unwrap().clone()
    }
}

impl Reporter for CollectingReporter {
    fn warn(&self, message: &str) {
        self.warnings.write().unwrap().push(message.to_string());
    }

    fn verbose(&self, message: &str) {
        self.verbose.write().unwrap().push(message.to_string());
    }
}

/// Dynamic request provider returning a canned list and counting calls.
///
/// The call count verifies that resolution runs at most once per
/// build-cache lifetime.
pub struct CannedRequests {
    requests: Vec<RequestConfig>,
    calls: Arc<RwLock<usize>>,
}

impl CannedRequests {
    pub fn new(requests: Vec<RequestConfig>) -> Self {
        Self {
            requests,
            calls: Arc::new(RwLock::new(0)),
        }
    }

    /// Number of times the provider ran.
    pub fn call_count(&self) -> usize {
        *self.calls.read().unwrap()
    }
}

/// Dynamic single-request provider returning a canned config and
/// counting calls.
pub struct CannedRequest {
    request: RequestConfig,
    calls: Arc<RwLock<usize>>,
}

impl CannedRequest {
    pub fn new(request: RequestConfig) -> Self {
        Self {
            request,
            calls: Arc::new(RwLock::new(0)),
        }
    }

    /// Number of times the provider ran.
    pub fn call_count(&self) -> usize {
        *self.calls.read().unwrap()
    }
}

#[async_trait]
impl ResolveRequest for CannedRequest {
    async fn resolve(
        &self,
        _options: &SourceOptions,
        _ctx: &SourceContext,
    ) -> Result<RequestConfig, BoxError> {
        *self.calls.write().unwrap() += 1;
        Ok(self.request.clone())
    }
}

#[async_trait]
impl ResolveRequests for CannedRequests {
    async fn resolve(
        &self,
        _options: &SourceOptions,
        _ctx: &SourceContext,
    ) -> Result<Vec<RequestConfig>, BoxError> {
        *self.calls.write().unwrap() += 1;
        Ok(self.requests.clone())
    }
}

/// Aggregate serializer combining all response bodies into one object
/// keyed by request name.
#[derive(Default)]
pub struct CombineBodies;

#[async_trait]
impl SerializeAll for CombineBodies {
    async fn serialize_all(
        &self,
        responses: &[ResponseContext],
        _ctx: &SourceContext,
    ) -> Result<Value, BoxError> {
        let mut combined = serde_json::Map::new();
        for context in responses {
            combined.insert(
                context.request.name().to_string(),
                context.response.data.clone(),
            );
        }
        Ok(Value::Object(combined))
    }
}
