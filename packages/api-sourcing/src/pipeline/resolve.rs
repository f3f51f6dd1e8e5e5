//! Request resolution: expand the instance options into a validated list
//! of immutable request descriptors.

use tracing::debug;

use crate::error::{ConfigError, ResolveError, Result, SourceError};
use crate::keys::{is_reserved_key, is_valid_key};
use crate::types::config::{RequestsSpec, SourceOptions};
use crate::types::context::SourceContext;
use crate::types::request::{
    DataSource, RequestConfig, RequestDescriptor, SerializeStrategy, DEFAULT_TYPE_PREFIX,
};

/// Resolve the instance options into concrete request descriptors.
///
/// Mode priority is fixed: a dynamic single-request provider, then a
/// dynamic list provider, then a static list, then the options themselves
/// as the one request. Provider failures are fatal and never retried.
/// Every raw config is merged with the instance defaults and validated;
/// any validation failure aborts resolution.
pub async fn resolve(
    options: &SourceOptions,
    ctx: &SourceContext,
) -> Result<Vec<RequestDescriptor>> {
    check_options(options)?;

    let raw: Vec<RequestConfig> = match &options.requests {
        RequestsSpec::Dynamic(provider) => {
            let request = provider
                .resolve(options, ctx)
                .await
                .map_err(ResolveError::Provider)?;
            vec![request]
        }
        RequestsSpec::DynamicList(provider) => provider
            .resolve(options, ctx)
            .await
            .map_err(ResolveError::Provider)?,
        RequestsSpec::Static(requests) => requests.clone(),
        RequestsSpec::Options => vec![options.as_request()],
    };

    debug!(
        instance = ctx.instance(),
        count = raw.len(),
        "resolved raw request list"
    );

    let mut descriptors = Vec::with_capacity(raw.len());
    let mut seen: Vec<String> = Vec::with_capacity(raw.len());

    for request in &raw {
        let merged = request.merged_with_defaults(&options.defaults);
        let descriptor = validate(merged)?;

        if seen.iter().any(|name| name == descriptor.name()) {
            return Err(ConfigError::Invalid {
                name: descriptor.name().to_string(),
                problems: vec!["duplicate request name".to_string()],
            }
            .into());
        }
        seen.push(descriptor.name().to_string());
        descriptors.push(descriptor);
    }

    Ok(descriptors)
}

/// Pre-flight checks on the instance options themselves.
fn check_options(options: &SourceOptions) -> Result<()> {
    if options.serialize_all.is_some() {
        let mut problems = Vec::new();
        if options.defaults.entry_point.is_some() {
            problems.push("`entry_point` and `serialize_all` are mutually exclusive".to_string());
        }
        if options.defaults.serializer.is_some() {
            problems.push("`serialize` and `serialize_all` are mutually exclusive".to_string());
        }
        if !problems.is_empty() {
            return Err(ConfigError::Invalid {
                name: options.name.clone(),
                problems,
            }
            .into());
        }
    }
    Ok(())
}

/// Validate one merged config into an immutable descriptor.
///
/// Collects every offending field so the operator sees the full picture
/// in a single failure.
pub(crate) fn validate(config: RequestConfig) -> Result<RequestDescriptor> {
    let name = match config.name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Err(SourceError::Config(ConfigError::MissingName)),
    };
    if is_reserved_key(&name) {
        return Err(SourceError::Config(ConfigError::ReservedName { name }));
    }

    let mut problems = Vec::new();

    let fetch_options = config.fetch_options.clone().unwrap_or_default();

    // A custom fetcher ignores endpoints entirely, so the conflict only
    // matters for the built-in HTTP fetch.
    if config.fetcher.is_none() && config.endpoint.is_some() && fetch_options.endpoint.is_some() {
        problems.push(
            "only one of `endpoint` and `fetch_options.endpoint` may be set".to_string(),
        );
    }

    if config.entry_point.is_some() && config.serializer.is_some() {
        problems.push("`entry_point` and `serialize` are mutually exclusive".to_string());
    }

    if let Some(list_key) = &config.list_key {
        if !is_valid_key(list_key) || is_reserved_key(list_key) {
            problems.push(format!("`list_key` `{list_key}` is not a valid field name"));
        }
    }

    let type_prefix = config
        .type_prefix
        .clone()
        .unwrap_or_else(|| DEFAULT_TYPE_PREFIX.to_string());
    if !is_valid_key(&type_prefix) || is_reserved_key(&type_prefix) {
        problems.push(format!(
            "`type_prefix` `{type_prefix}` is not a valid type name"
        ));
    }

    if !problems.is_empty() {
        return Err(SourceError::Config(ConfigError::Invalid { name, problems }));
    }

    // fetch_options.endpoint wins over the top-level field. A missing
    // endpoint is legal here; the built-in fetch reports it per request.
    let source = match config.fetcher {
        Some(fetcher) => DataSource::Custom(fetcher),
        None => DataSource::Http {
            endpoint: fetch_options
                .endpoint
                .clone()
                .or_else(|| config.endpoint.clone()),
        },
    };

    let strategy = match (&config.serializer, &config.entry_point) {
        (Some(serializer), _) => SerializeStrategy::Custom(serializer.clone()),
        (None, Some(entry_point)) => SerializeStrategy::EntryPoint(entry_point.segments()),
        (None, None) => SerializeStrategy::WholeBody,
    };

    let metadata = config
        .metadata
        .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

    Ok(RequestDescriptor::new(
        name,
        source,
        fetch_options,
        strategy,
        config.entry_point,
        metadata,
        config.schema,
        config.list_key,
        Some(type_prefix),
        config.kill_on_request_error.unwrap_or(true),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::host::TracingReporter;
    use serde_json::json;
    use std::sync::Arc;

    fn ctx() -> SourceContext {
        SourceContext::new("test", Arc::new(TracingReporter))
    }

    #[tokio::test]
    async fn static_list_preserves_length_and_merges() {
        let options = SourceOptions::new("github")
            .with_defaults(
                RequestConfig::new()
                    .with_type_prefix("github")
                    .with_metadata(json!({"team": "infra"})),
            )
            .with_requests(vec![
                RequestConfig::named("repos")
                    .with_endpoint("https://api.github.com/repos".parse().unwrap()),
                RequestConfig::named("issues")
                    .with_endpoint("https://api.github.com/issues".parse().unwrap())
                    .with_metadata(json!({"team": "qa"})),
            ]);

        let descriptors = resolve(&options, &ctx()).await.unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].name(), "repos");
        assert_eq!(descriptors[0].type_prefix(), Some("github"));
        assert_eq!(descriptors[0].metadata(), &json!({"team": "infra"}));
        assert_eq!(descriptors[1].metadata(), &json!({"team": "qa"}));
    }

    #[tokio::test]
    async fn options_mode_yields_single_request() {
        let options = SourceOptions::new("single").with_defaults(
            RequestConfig::new().with_endpoint("https://api.example.com/data".parse().unwrap()),
        );

        let descriptors = resolve(&options, &ctx()).await.unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name(), "single");
        assert_eq!(descriptors[0].type_prefix(), Some("external"));
        assert!(descriptors[0].kill_on_request_error());
    }

    #[tokio::test]
    async fn missing_name_is_fatal() {
        let options = SourceOptions::new("x").with_requests(vec![RequestConfig::new()
            .with_endpoint("https://api.example.com/".parse().unwrap())]);

        let err = resolve(&options, &ctx()).await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::Config(ConfigError::MissingName)
        ));
    }

    #[tokio::test]
    async fn reserved_name_is_fatal() {
        let options = SourceOptions::new("x").with_requests(vec![RequestConfig::named("id")]);
        let err = resolve(&options, &ctx()).await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::Config(ConfigError::ReservedName { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_names_are_fatal() {
        let options = SourceOptions::new("x").with_requests(vec![
            RequestConfig::named("repos"),
            RequestConfig::named("repos"),
        ]);
        let err = resolve(&options, &ctx()).await.unwrap_err();
        assert!(matches!(err, SourceError::Config(ConfigError::Invalid { .. })));
    }

    #[tokio::test]
    async fn conflicting_endpoints_collect_problems() {
        let fetch_options = crate::types::request::FetchOptions {
            endpoint: Some("https://a.example.com/".parse().unwrap()),
            ..Default::default()
        };
        let options = SourceOptions::new("x").with_requests(vec![RequestConfig::named("dup")
            .with_endpoint("https://b.example.com/".parse().unwrap())
            .with_fetch_options(fetch_options)
            .with_list_key("invalid-key")]);

        let err = resolve(&options, &ctx()).await.unwrap_err();
        match err {
            SourceError::Config(ConfigError::Invalid { name, problems }) => {
                assert_eq!(name, "dup");
                assert_eq!(problems.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn fetch_options_endpoint_is_preferred() {
        let fetch_options = crate::types::request::FetchOptions {
            endpoint: Some("https://preferred.example.com/".parse().unwrap()),
            ..Default::default()
        };
        let descriptor =
            validate(RequestConfig::named("repos").with_fetch_options(fetch_options)).unwrap();
        assert_eq!(
            descriptor.endpoint().map(|u| u.as_str()),
            Some("https://preferred.example.com/")
        );
    }
}
