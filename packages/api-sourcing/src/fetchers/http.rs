//! Built-in HTTP JSON fetch with a fixed retry policy.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::types::context::SourceContext;
use crate::types::request::{FetchOptions, RequestDescriptor};
use crate::types::response::FetchResponse;

/// Number of automatic retries on transient failure.
const MAX_RETRIES: u32 = 3;

/// Base delay between retry attempts.
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Executes the built-in HTTP fetch for endpoint-sourced requests.
///
/// Expects a JSON body and retries up to 3 times on transient failures
/// (network errors and 5xx statuses). Not a general HTTP client: the
/// retry policy is fixed and there is no redirect or auth handling beyond
/// what `reqwest` does by default.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a fetcher with a default client (30s timeout).
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Use a custom `reqwest` client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Execute one request against its resolved endpoint.
    pub async fn fetch_json(
        &self,
        request: &RequestDescriptor,
        ctx: &SourceContext,
    ) -> FetchResult<FetchResponse> {
        let endpoint = request
            .endpoint()
            .ok_or_else(|| FetchError::MissingEndpoint {
                name: request.name().to_string(),
            })?;

        let options = request.fetch_options();

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            debug!(
                endpoint = %endpoint,
                request = request.name(),
                attempt,
                "HTTP fetch"
            );

            match self.send(endpoint, options).await {
                Ok(response) => return Ok(response),
                Err(err) if is_transient(&err) && attempt <= MAX_RETRIES => {
                    warn!(
                        endpoint = %endpoint,
                        request = request.name(),
                        attempt,
                        error = %err,
                        "transient fetch failure, retrying"
                    );
                    ctx.verbose(&format!(
                        "retrying `{}` after transient failure (attempt {attempt})",
                        request.name()
                    ));
                    tokio::time::sleep(RETRY_DELAY * attempt).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send(&self, endpoint: &Url, options: &FetchOptions) -> FetchResult<FetchResponse> {
        let method: reqwest::Method = options.method.unwrap_or_default().into();
        let mut builder = self.client.request(method, endpoint.clone());

        for (key, value) in &options.headers {
            builder = builder.header(key, value);
        }
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }
        if let Some(timeout_secs) = options.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }

        let response = builder.send().await.map_err(|e| FetchError::Http {
            endpoint: endpoint.to_string(),
            source: Box::new(e),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();

        let data: Value = response.json().await.map_err(|e| FetchError::Json {
            endpoint: endpoint.to_string(),
            source: Box::new(e),
        })?;

        Ok(FetchResponse::with_headers(data, headers))
    }
}

/// Classify a fetch error for the retry decision.
///
/// Network failures and 5xx statuses may succeed on retry; everything
/// else (missing endpoint, 4xx, malformed JSON) is permanent.
fn is_transient(error: &FetchError) -> bool {
    match error {
        FetchError::Http { .. } => true,
        FetchError::Status { status, .. } => *status >= 500,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_error() -> FetchError {
        FetchError::Http {
            endpoint: "https://api.example.com/".to_string(),
            source: "connection refused".into(),
        }
    }

    #[test]
    fn network_errors_are_transient() {
        assert!(is_transient(&http_error()));
    }

    #[test]
    fn server_errors_are_transient() {
        let err = FetchError::Status {
            status: 503,
            endpoint: "https://api.example.com/".to_string(),
        };
        assert!(is_transient(&err));
    }

    #[test]
    fn client_errors_are_permanent() {
        let not_found = FetchError::Status {
            status: 404,
            endpoint: "https://api.example.com/".to_string(),
        };
        assert!(!is_transient(&not_found));

        let missing = FetchError::MissingEndpoint {
            name: "repos".to_string(),
        };
        assert!(!is_transient(&missing));
    }
}
