//! Dynamic request resolution traits.
//!
//! These are the operator extension points for computing the request list
//! at build time, e.g. paginated index endpoints or per-environment
//! request sets. Implementations are trusted to be deterministic; the
//! pipeline calls them at most once per build-cache lifetime and never
//! retries a failure.

use async_trait::async_trait;

use crate::traits::host::BoxError;
use crate::types::config::SourceOptions;
use crate::types::context::SourceContext;
use crate::types::request::RequestConfig;

/// Compute a single request configuration dynamically.
#[async_trait]
pub trait ResolveRequest: Send + Sync {
    /// Produce the one request this instance should execute.
    async fn resolve(
        &self,
        options: &SourceOptions,
        ctx: &SourceContext,
    ) -> Result<RequestConfig, BoxError>;
}

/// Compute a list of request configurations dynamically.
#[async_trait]
pub trait ResolveRequests: Send + Sync {
    /// Produce every request this instance should execute.
    async fn resolve(
        &self,
        options: &SourceOptions,
        ctx: &SourceContext,
    ) -> Result<Vec<RequestConfig>, BoxError>;
}
