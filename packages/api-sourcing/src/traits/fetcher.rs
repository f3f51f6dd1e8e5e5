//! Fetcher trait for operator-supplied data sources.

use async_trait::async_trait;
use serde_json::Value;

use crate::traits::host::BoxError;
use crate::types::context::SourceContext;
use crate::types::request::RequestDescriptor;

/// Operator-supplied replacement for the built-in HTTP fetch.
///
/// A request configured with a custom fetcher bypasses endpoint resolution
/// entirely; whatever the fetcher returns becomes the response body
/// (without headers).
///
/// Returning `Ok(None)` signals "no data" and is treated like a fetch
/// failure under the request's `kill_on_request_error` policy. Errors
/// propagate to the same policy; they are never retried.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Produce the response body for one request.
    async fn fetch(
        &self,
        request: &RequestDescriptor,
        ctx: &SourceContext,
    ) -> Result<Option<Value>, BoxError>;

    /// Name for logging and debugging.
    fn name(&self) -> &str {
        "custom"
    }
}
