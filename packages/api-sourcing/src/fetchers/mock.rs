//! Mock fetcher for testing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::traits::fetcher::Fetcher;
use crate::traits::host::BoxError;
use crate::types::context::SourceContext;
use crate::types::request::RequestDescriptor;

/// Behavior of the mock for one request name.
#[derive(Debug, Clone)]
enum CannedResult {
    Data(Value),
    Empty,
    Failure(String),
}

/// Configurable [`Fetcher`] test double.
///
/// Returns canned payloads per request name, with a configurable default,
/// and records the names it was called with.
///
/// ```rust,ignore
/// let fetcher = MockFetcher::new();
/// fetcher.set_response("repos", json!([{"id": 1}]));
/// fetcher.set_failure("broken", "boom");
/// ```
#[derive(Default)]
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, CannedResult>>>,
    default: Arc<RwLock<Option<CannedResult>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    /// Create an empty mock; unknown requests yield an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned payload for one request name.
    pub fn set_response(&self, name: impl Into<String>, data: Value) {
        self.responses
            .write()
            .unwrap()
            .insert(name.into(), CannedResult::Data(data));
    }

    /// Make one request name return no data (a void fetch).
    pub fn set_empty(&self, name: impl Into<String>) {
        self.responses
            .write()
            .unwrap()
            .insert(name.into(), CannedResult::Empty);
    }

    /// Make one request name fail.
    pub fn set_failure(&self, name: impl Into<String>, message: impl Into<String>) {
        self.responses
            .write()
            .unwrap()
            .insert(name.into(), CannedResult::Failure(message.into()));
    }

    /// Payload returned for any request without a canned entry.
    pub fn set_default_response(&self, data: Value) {
        *self.default.write().unwrap() = Some(CannedResult::Data(data));
    }

    /// Names of the requests fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Number of fetches performed.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(
        &self,
        request: &RequestDescriptor,
        _ctx: &SourceContext,
    ) -> Result<Option<Value>, BoxError> {
        self.calls
            .write()
            .unwrap()
            .push(request.name().to_string());

        let canned = self
            .responses
            .read()
            .unwrap()
            .get(request.name())
            .cloned()
            .or_else(|| self.default.read().unwrap().clone());

        match canned {
            Some(CannedResult::Data(data)) => Ok(Some(data)),
            Some(CannedResult::Failure(message)) => Err(message.into()),
            Some(CannedResult::Empty) | None => Ok(None),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
