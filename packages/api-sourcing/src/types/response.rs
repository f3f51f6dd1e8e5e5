//! Response shapes flowing between fetch, serialize, and materialize.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::request::RequestDescriptor;

/// Raw result of one fetch.
///
/// Custom fetchers produce only a body; the built-in HTTP fetch also
/// carries response headers.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Response headers, absent for custom fetchers.
    pub headers: Option<BTreeMap<String, String>>,

    /// The response body.
    pub data: Value,

    /// When the response was received.
    pub fetched_at: DateTime<Utc>,
}

impl FetchResponse {
    /// Wrap a bare body, as produced by custom fetchers.
    pub fn from_data(data: Value) -> Self {
        Self {
            headers: None,
            data,
            fetched_at: Utc::now(),
        }
    }

    /// Wrap a body together with response headers.
    pub fn with_headers(data: Value, headers: BTreeMap<String, String>) -> Self {
        Self {
            headers: Some(headers),
            data,
            fetched_at: Utc::now(),
        }
    }
}

/// A request paired with its raw response. Input to the aggregate
/// serialization step.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    pub request: RequestDescriptor,
    pub response: FetchResponse,
}

/// A request paired with its serialized payload, ready to materialize.
///
/// `response` is absent for the synthetic aggregate result, which has no
/// single raw response of its own.
#[derive(Debug, Clone)]
pub struct SerializedContext {
    pub request: RequestDescriptor,
    pub response: Option<FetchResponse>,
    pub serialized: Value,
}
