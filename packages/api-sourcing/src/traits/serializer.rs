//! Serializer traits for operator-supplied response transforms.

use async_trait::async_trait;
use serde_json::Value;

use crate::traits::host::BoxError;
use crate::types::context::SourceContext;
use crate::types::request::RequestDescriptor;
use crate::types::response::{FetchResponse, ResponseContext};

/// Operator-supplied transform from a raw response to the emitted payload.
///
/// Mutually exclusive with an `entry_point` path on the same request; the
/// pipeline delegates entirely to the implementation. Errors are fatal for
/// the whole run.
#[async_trait]
pub trait Serializer: Send + Sync {
    /// Extract the payload to materialize from one response.
    async fn serialize(
        &self,
        response: &FetchResponse,
        request: &RequestDescriptor,
        ctx: &SourceContext,
    ) -> Result<Value, BoxError>;
}

/// Operator-supplied aggregate transform over all responses of one run.
///
/// Runs once per pipeline invocation when more than one request resolved.
/// Its single payload replaces every per-request result: the instance
/// emits one synthetic record set instead of one per request. Errors are
/// fatal.
#[async_trait]
pub trait SerializeAll: Send + Sync {
    /// Combine all fetched responses into a single payload.
    async fn serialize_all(
        &self,
        responses: &[ResponseContext],
        ctx: &SourceContext,
    ) -> Result<Value, BoxError>;
}
