//! Request configuration and resolved request descriptors.
//!
//! [`RequestConfig`] is the raw, mergeable shape an operator writes (or a
//! dynamic provider returns). Resolution merges each config with the
//! instance-wide defaults and validates it into an immutable
//! [`RequestDescriptor`], whose tagged [`DataSource`] and
//! [`SerializeStrategy`] enums make the "exactly one strategy" invariants
//! impossible to violate after validation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::merge::merge_optional;
use crate::traits::fetcher::Fetcher;
use crate::traits::serializer::Serializer;
use crate::types::schema::TypeSchema;

/// Default type prefix for emitted records.
pub const DEFAULT_TYPE_PREFIX: &str = "external";

/// HTTP methods the built-in fetch supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Head,
    Options,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// Options applied to the built-in HTTP fetch.
///
/// Merged by deep-merge from the instance-wide defaults and the
/// per-request override: scalars override, maps combine per key, the body
/// deep-merges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    /// Endpoint override; preferred over the request's top-level endpoint.
    pub endpoint: Option<Url>,

    /// HTTP method, defaults to GET.
    pub method: Option<HttpMethod>,

    /// Request headers.
    pub headers: BTreeMap<String, String>,

    /// Query-string parameters.
    pub query: BTreeMap<String, String>,

    /// JSON request body.
    pub body: Option<Value>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl FetchOptions {
    /// Deep-merge `overlay` onto `self`; overlay leaves win.
    pub fn merged_with(&self, overlay: &FetchOptions) -> FetchOptions {
        let mut headers = self.headers.clone();
        headers.extend(overlay.headers.clone());

        let mut query = self.query.clone();
        query.extend(overlay.query.clone());

        FetchOptions {
            endpoint: overlay.endpoint.clone().or_else(|| self.endpoint.clone()),
            method: overlay.method.or(self.method),
            headers,
            query,
            body: merge_optional(self.body.as_ref(), overlay.body.as_ref()),
            timeout_secs: overlay.timeout_secs.or(self.timeout_secs),
        }
    }
}

/// A path into a raw response body identifying the substructure to keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryPoint {
    /// Dot/bracket path, e.g. `"data.items[0]"`.
    Path(String),
    /// Explicit path segments.
    Segments(Vec<String>),
}

impl EntryPoint {
    /// The path as a segment list, parsing dot/bracket syntax if needed.
    pub fn segments(&self) -> Vec<String> {
        match self {
            EntryPoint::Segments(segments) => segments.clone(),
            EntryPoint::Path(path) => parse_path(path),
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPoint::Path(path) => write!(f, "{path}"),
            EntryPoint::Segments(segments) => write!(f, "[{}]", segments.join(",")),
        }
    }
}

/// Parse a dot/bracket path into segments: `"a.b[0].c"` yields
/// `["a", "b", "0", "c"]`. Bracket contents may be quoted.
fn parse_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                let mut inner = String::new();
                for inner_c in chars.by_ref() {
                    if inner_c == ']' {
                        break;
                    }
                    inner.push(inner_c);
                }
                let trimmed = inner.trim_matches(|q| q == '"' || q == '\'');
                segments.push(trimmed.to_string());
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Raw, mergeable request configuration.
///
/// Every field is optional; the instance-wide defaults fill the gaps
/// during resolution. Built with `with_*` methods:
///
/// ```rust
/// use api_sourcing::types::request::RequestConfig;
///
/// let request = RequestConfig::named("repos")
///     .with_endpoint("https://api.github.com/users/octocat/repos".parse().unwrap())
///     .with_entry_point("data.items");
/// ```
#[derive(Clone, Default)]
pub struct RequestConfig {
    /// Unique request name; required after merging.
    pub name: Option<String>,

    /// Endpoint for the built-in HTTP fetch.
    pub endpoint: Option<Url>,

    /// Options for the built-in HTTP fetch.
    pub fetch_options: Option<FetchOptions>,

    /// Path into the response body.
    pub entry_point: Option<EntryPoint>,

    /// Custom fetcher replacing the built-in HTTP fetch.
    pub fetcher: Option<Arc<dyn Fetcher>>,

    /// Custom serializer replacing the entry-point walk.
    pub serializer: Option<Arc<dyn Serializer>>,

    /// Opaque pass-through bag, deep-merged like `fetch_options`.
    pub metadata: Option<Value>,

    /// Type-schema definition for the host registry.
    pub schema: Option<TypeSchema>,

    /// Field name used when wrapping primitive or nested-array entries.
    pub list_key: Option<String>,

    /// Prefix for the emitted record type, defaults to `"external"`.
    pub type_prefix: Option<String>,

    /// Whether a failed fetch aborts the whole run. Defaults to true.
    pub kill_on_request_error: Option<bool>,
}

impl RequestConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set the fetch options.
    pub fn with_fetch_options(mut self, fetch_options: FetchOptions) -> Self {
        self.fetch_options = Some(fetch_options);
        self
    }

    /// Set the entry point from a dot/bracket path.
    pub fn with_entry_point(mut self, path: impl Into<String>) -> Self {
        self.entry_point = Some(EntryPoint::Path(path.into()));
        self
    }

    /// Set the entry point from explicit segments.
    pub fn with_entry_segments(
        mut self,
        segments: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.entry_point = Some(EntryPoint::Segments(
            segments.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Attach a custom fetcher.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Attach a custom serializer.
    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Set the metadata bag.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Set the type schema.
    pub fn with_schema(mut self, schema: TypeSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the list key.
    pub fn with_list_key(mut self, list_key: impl Into<String>) -> Self {
        self.list_key = Some(list_key.into());
        self
    }

    /// Set the type prefix.
    pub fn with_type_prefix(mut self, type_prefix: impl Into<String>) -> Self {
        self.type_prefix = Some(type_prefix.into());
        self
    }

    /// Set the failure policy.
    pub fn with_kill_on_request_error(mut self, kill: bool) -> Self {
        self.kill_on_request_error = Some(kill);
        self
    }

    /// Merge instance-wide defaults under this config.
    ///
    /// Shallow field-wise: a local value wins over the default, except
    /// `fetch_options` and `metadata`, which deep-merge with local leaves
    /// winning.
    pub fn merged_with_defaults(&self, defaults: &RequestConfig) -> RequestConfig {
        let fetch_options = match (&defaults.fetch_options, &self.fetch_options) {
            (Some(base), Some(overlay)) => Some(base.merged_with(overlay)),
            (Some(base), None) => Some(base.clone()),
            (None, Some(overlay)) => Some(overlay.clone()),
            (None, None) => None,
        };

        RequestConfig {
            name: self.name.clone().or_else(|| defaults.name.clone()),
            endpoint: self.endpoint.clone().or_else(|| defaults.endpoint.clone()),
            fetch_options,
            entry_point: self
                .entry_point
                .clone()
                .or_else(|| defaults.entry_point.clone()),
            fetcher: self.fetcher.clone().or_else(|| defaults.fetcher.clone()),
            serializer: self
                .serializer
                .clone()
                .or_else(|| defaults.serializer.clone()),
            metadata: merge_optional(defaults.metadata.as_ref(), self.metadata.as_ref()),
            schema: self.schema.clone().or_else(|| defaults.schema.clone()),
            list_key: self.list_key.clone().or_else(|| defaults.list_key.clone()),
            type_prefix: self
                .type_prefix
                .clone()
                .or_else(|| defaults.type_prefix.clone()),
            kill_on_request_error: self.kill_on_request_error.or(defaults.kill_on_request_error),
        }
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("fetch_options", &self.fetch_options)
            .field("entry_point", &self.entry_point)
            .field("fetcher", &self.fetcher.as_ref().map(|f| f.name()))
            .field("serializer", &self.serializer.is_some())
            .field("metadata", &self.metadata)
            .field("list_key", &self.list_key)
            .field("type_prefix", &self.type_prefix)
            .field("kill_on_request_error", &self.kill_on_request_error)
            .finish()
    }
}

/// Where a request's data comes from. Exactly one source per request.
#[derive(Clone)]
pub enum DataSource {
    /// Built-in HTTP fetch. The endpoint is resolved at validation
    /// (`fetch_options.endpoint` preferred over the top-level field) but
    /// may still be absent; that surfaces as a fetch-time error governed
    /// by the failure policy.
    Http { endpoint: Option<Url> },

    /// Operator-supplied fetcher.
    Custom(Arc<dyn Fetcher>),
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Http { endpoint } => {
                f.debug_struct("Http").field("endpoint", endpoint).finish()
            }
            DataSource::Custom(fetcher) => f.debug_tuple("Custom").field(&fetcher.name()).finish(),
        }
    }
}

/// How a request's response becomes the emitted payload.
#[derive(Clone, Default)]
pub enum SerializeStrategy {
    /// Keep the whole response body.
    #[default]
    WholeBody,

    /// Walk the body by these path segments.
    EntryPoint(Vec<String>),

    /// Operator-supplied serializer.
    Custom(Arc<dyn Serializer>),
}

impl fmt::Debug for SerializeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializeStrategy::WholeBody => write!(f, "WholeBody"),
            SerializeStrategy::EntryPoint(segments) => {
                f.debug_tuple("EntryPoint").field(segments).finish()
            }
            SerializeStrategy::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// A fully-resolved, validated unit of work.
///
/// Immutable once resolved; the orchestrator only reads it. Cloning is
/// cheap (shared callables).
#[derive(Clone)]
pub struct RequestDescriptor {
    name: String,
    source: DataSource,
    fetch_options: FetchOptions,
    strategy: SerializeStrategy,
    entry_point: Option<EntryPoint>,
    metadata: Value,
    schema: Option<TypeSchema>,
    list_key: Option<String>,
    type_prefix: Option<String>,
    kill_on_request_error: bool,
}

impl RequestDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        source: DataSource,
        fetch_options: FetchOptions,
        strategy: SerializeStrategy,
        entry_point: Option<EntryPoint>,
        metadata: Value,
        schema: Option<TypeSchema>,
        list_key: Option<String>,
        type_prefix: Option<String>,
        kill_on_request_error: bool,
    ) -> Self {
        Self {
            name,
            source,
            fetch_options,
            strategy,
            entry_point,
            metadata,
            schema,
            list_key,
            type_prefix,
            kill_on_request_error,
        }
    }

    /// Unique request name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The data source for this request.
    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// HTTP options for the built-in fetch.
    pub fn fetch_options(&self) -> &FetchOptions {
        &self.fetch_options
    }

    /// The serialization strategy.
    pub fn strategy(&self) -> &SerializeStrategy {
        &self.strategy
    }

    /// The declared entry point, for diagnostics.
    pub fn entry_point(&self) -> Option<&EntryPoint> {
        self.entry_point.as_ref()
    }

    /// Opaque metadata bag.
    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    /// Type-schema definition, if any.
    pub fn schema(&self) -> Option<&TypeSchema> {
        self.schema.as_ref()
    }

    /// Wrapping key for primitive or nested-array entries.
    pub fn list_key(&self) -> Option<&str> {
        self.list_key.as_deref()
    }

    /// Prefix for the emitted record type.
    pub fn type_prefix(&self) -> Option<&str> {
        self.type_prefix.as_deref()
    }

    /// Whether a failed fetch aborts the whole run.
    pub fn kill_on_request_error(&self) -> bool {
        self.kill_on_request_error
    }

    /// The resolved endpoint, if this is an HTTP request with one.
    pub fn endpoint(&self) -> Option<&Url> {
        match &self.source {
            DataSource::Http { endpoint } => endpoint.as_ref(),
            DataSource::Custom(_) => None,
        }
    }

    /// The serializable projection of this descriptor.
    pub fn snapshot(&self) -> RequestSnapshot {
        RequestSnapshot {
            name: self.name.clone(),
            endpoint: self.endpoint().cloned(),
            fetch_options: self.fetch_options.clone(),
            entry_point: self.entry_point.clone(),
            metadata: self.metadata.clone(),
            static_schema: match &self.schema {
                Some(TypeSchema::Static(definition)) => Some(definition.clone()),
                _ => None,
            },
            computed_schema: matches!(&self.schema, Some(TypeSchema::Computed(_))),
            list_key: self.list_key.clone(),
            type_prefix: self.type_prefix.clone(),
            kill_on_request_error: self.kill_on_request_error,
            custom_fetch: matches!(self.source, DataSource::Custom(_)),
            custom_serialize: matches!(self.strategy, SerializeStrategy::Custom(_)),
        }
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("strategy", &self.strategy)
            .field("list_key", &self.list_key)
            .field("type_prefix", &self.type_prefix)
            .field("kill_on_request_error", &self.kill_on_request_error)
            .finish_non_exhaustive()
    }
}

/// Serializable projection of a [`RequestDescriptor`] for the build cache.
///
/// Callables cannot persist; flags record that they were present so a
/// later build can revive them from the instance options (or fall back to
/// re-resolving when it cannot).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub name: String,
    pub endpoint: Option<Url>,
    #[serde(default)]
    pub fetch_options: FetchOptions,
    pub entry_point: Option<EntryPoint>,
    #[serde(default)]
    pub metadata: Value,
    pub static_schema: Option<String>,
    #[serde(default)]
    pub computed_schema: bool,
    pub list_key: Option<String>,
    pub type_prefix: Option<String>,
    pub kill_on_request_error: bool,
    #[serde(default)]
    pub custom_fetch: bool,
    #[serde(default)]
    pub custom_serialize: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_simple_dot_path() {
        assert_eq!(parse_path("data.items"), vec!["data", "items"]);
    }

    #[test]
    fn parse_bracket_path() {
        assert_eq!(parse_path("a.b[0].c"), vec!["a", "b", "0", "c"]);
        assert_eq!(parse_path("a[\"x.y\"]"), vec!["a", "x.y"]);
        assert_eq!(parse_path("items[10]"), vec!["items", "10"]);
    }

    #[test]
    fn parse_single_segment() {
        assert_eq!(parse_path("data"), vec!["data"]);
    }

    #[test]
    fn entry_point_segments() {
        let path = EntryPoint::Path("data.items".to_string());
        assert_eq!(path.segments(), vec!["data", "items"]);

        let explicit = EntryPoint::Segments(vec!["a".into(), "b".into()]);
        assert_eq!(explicit.segments(), vec!["a", "b"]);
    }

    #[test]
    fn fetch_options_merge_prefers_overlay() {
        let base = FetchOptions {
            method: Some(HttpMethod::Get),
            headers: BTreeMap::from([
                ("accept".to_string(), "application/json".to_string()),
                ("x-base".to_string(), "1".to_string()),
            ]),
            ..FetchOptions::default()
        };
        let overlay = FetchOptions {
            method: Some(HttpMethod::Post),
            headers: BTreeMap::from([("x-base".to_string(), "2".to_string())]),
            ..FetchOptions::default()
        };

        let merged = base.merged_with(&overlay);
        assert_eq!(merged.method, Some(HttpMethod::Post));
        assert_eq!(
            merged.headers.get("accept"),
            Some(&"application/json".to_string())
        );
        assert_eq!(merged.headers.get("x-base"), Some(&"2".to_string()));
    }

    #[test]
    fn fetch_options_body_deep_merges() {
        let base = FetchOptions {
            body: Some(json!({"page": 1, "filter": {"state": "open"}})),
            ..FetchOptions::default()
        };
        let overlay = FetchOptions {
            body: Some(json!({"filter": {"labels": ["bug"]}})),
            ..FetchOptions::default()
        };

        let merged = base.merged_with(&overlay);
        assert_eq!(
            merged.body,
            Some(json!({"page": 1, "filter": {"state": "open", "labels": ["bug"]}}))
        );
    }

    #[test]
    fn config_merge_local_wins_on_scalars() {
        let defaults = RequestConfig::new()
            .with_type_prefix("github")
            .with_kill_on_request_error(false)
            .with_metadata(json!({"team": "infra", "tier": 1}));
        let local = RequestConfig::named("repos")
            .with_kill_on_request_error(true)
            .with_metadata(json!({"tier": 2}));

        let merged = local.merged_with_defaults(&defaults);
        assert_eq!(merged.name.as_deref(), Some("repos"));
        assert_eq!(merged.type_prefix.as_deref(), Some("github"));
        assert_eq!(merged.kill_on_request_error, Some(true));
        assert_eq!(merged.metadata, Some(json!({"team": "infra", "tier": 2})));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let descriptor = RequestDescriptor::new(
            "repos".to_string(),
            DataSource::Http {
                endpoint: Some("https://api.github.com/repos".parse().unwrap()),
            },
            FetchOptions::default(),
            SerializeStrategy::EntryPoint(vec!["items".to_string()]),
            Some(EntryPoint::Path("items".to_string())),
            json!({}),
            None,
            None,
            Some("external".to_string()),
            true,
        );

        let snapshot = descriptor.snapshot();
        let value = serde_json::to_value(&snapshot).unwrap();
        let decoded: RequestSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.name, "repos");
        assert!(!decoded.custom_fetch);
        assert!(decoded.kill_on_request_error);
    }
}
