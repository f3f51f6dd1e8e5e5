//! Concurrent fetch fan-out and the per-request failure policy.

use futures::future::join_all;
use tracing::debug;

use crate::error::{FetchError, FetchResult, Result, SourceError};
use crate::fetchers::HttpFetcher;
use crate::types::context::SourceContext;
use crate::types::request::{DataSource, RequestDescriptor};
use crate::types::response::{FetchResponse, ResponseContext};

/// Joined results of one fan-out.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Requests that produced data, in descriptor order.
    pub responses: Vec<ResponseContext>,

    /// Names of requests dropped under `kill_on_request_error = false`.
    pub dropped: Vec<String>,
}

/// Execute every descriptor concurrently and apply the failure policy.
///
/// All legs are dispatched at once and joined; there is no completion
/// ordering guarantee and no cancellation of in-flight siblings. A
/// failing critical request (`kill_on_request_error = true`) aborts the
/// run; a failing non-critical one is warned and dropped.
pub async fn execute_all(
    descriptors: &[RequestDescriptor],
    http: &HttpFetcher,
    ctx: &SourceContext,
) -> Result<FetchOutcome> {
    let legs = descriptors
        .iter()
        .map(|descriptor| execute_one(descriptor, http, ctx));
    let results = join_all(legs).await;

    let mut responses = Vec::with_capacity(descriptors.len());
    let mut dropped = Vec::new();

    for (descriptor, result) in descriptors.iter().zip(results) {
        match result {
            Ok(Some(response)) => {
                debug!(
                    instance = ctx.instance(),
                    request = descriptor.name(),
                    "fetch succeeded"
                );
                responses.push(ResponseContext {
                    request: descriptor.clone(),
                    response,
                });
            }
            Ok(None) => {
                handle_failure(descriptor, FetchError::Empty, ctx, &mut dropped)?;
            }
            Err(err) => {
                handle_failure(descriptor, err, ctx, &mut dropped)?;
            }
        }
    }

    Ok(FetchOutcome { responses, dropped })
}

/// Execute one leg: custom fetcher or built-in HTTP fetch.
async fn execute_one(
    descriptor: &RequestDescriptor,
    http: &HttpFetcher,
    ctx: &SourceContext,
) -> FetchResult<Option<FetchResponse>> {
    match descriptor.source() {
        DataSource::Custom(fetcher) => {
            let data = fetcher
                .fetch(descriptor, ctx)
                .await
                .map_err(FetchError::Custom)?;
            Ok(data.map(FetchResponse::from_data))
        }
        DataSource::Http { .. } => {
            let response = http.fetch_json(descriptor, ctx).await?;
            Ok(Some(response))
        }
    }
}

/// Apply `kill_on_request_error` uniformly across both fetch paths.
fn handle_failure(
    descriptor: &RequestDescriptor,
    err: FetchError,
    ctx: &SourceContext,
    dropped: &mut Vec<String>,
) -> Result<()> {
    let location = match descriptor.endpoint() {
        Some(endpoint) => format!(" at {endpoint}"),
        None => String::new(),
    };

    if descriptor.kill_on_request_error() {
        return Err(SourceError::Fetch {
            name: descriptor.name().to_string(),
            source: err,
        });
    }

    ctx.warn(&format!(
        "an error occurred fetching data for `{}`{location}: {err}",
        descriptor.name()
    ));
    dropped.push(descriptor.name().to_string());
    Ok(())
}
