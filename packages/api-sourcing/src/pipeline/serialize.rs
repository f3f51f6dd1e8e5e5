//! Response serialization: extract the interesting payload from each raw
//! response, plus the once-per-run aggregate step.

use serde_json::Value;

use crate::error::{SerializeError, SerializeResult};
use crate::types::config::SourceOptions;
use crate::types::context::SourceContext;
use crate::types::request::{RequestDescriptor, SerializeStrategy};
use crate::types::response::{FetchResponse, ResponseContext, SerializedContext};

/// Serialize one response according to the request's strategy.
///
/// A custom serializer failing is fatal. An entry-point path that does
/// not resolve only warns and falls back to the whole body — upstream
/// shapes are untrusted and a partial dataset beats an aborted build.
pub async fn serialize_response(
    request: &RequestDescriptor,
    response: &FetchResponse,
    ctx: &SourceContext,
) -> SerializeResult<Value> {
    match request.strategy() {
        SerializeStrategy::Custom(serializer) => serializer
            .serialize(response, request, ctx)
            .await
            .map_err(|source| SerializeError::Custom {
                name: request.name().to_string(),
                source,
            }),
        SerializeStrategy::EntryPoint(segments) => {
            match walk_path(&response.data, segments) {
                Some(found) => Ok(found.clone()),
                None => {
                    let shown = request
                        .entry_point()
                        .map(|ep| ep.to_string())
                        .unwrap_or_else(|| segments.join("."));
                    ctx.warn(&format!(
                        "entry point `{shown}` does not exist in response body"
                    ));
                    Ok(response.data.clone())
                }
            }
        }
        SerializeStrategy::WholeBody => Ok(response.data.clone()),
    }
}

/// Run the aggregate serialization step.
///
/// Applies only when more than one request resolved and the options carry
/// a `serialize_all`; the single combined payload then replaces every
/// per-request result, keyed by the instance itself. Failure is fatal.
pub async fn aggregate(
    options: &SourceOptions,
    resolved_count: usize,
    responses: &[ResponseContext],
    ctx: &SourceContext,
) -> SerializeResult<Option<Value>> {
    let Some(serialize_all) = &options.serialize_all else {
        return Ok(None);
    };
    if resolved_count <= 1 {
        return Ok(None);
    }

    let combined = serialize_all
        .serialize_all(responses, ctx)
        .await
        .map_err(SerializeError::Aggregate)?;

    Ok(Some(combined))
}

/// Walk a JSON value by path segments. Array segments must be numeric.
fn walk_path<'a>(value: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Pair surviving responses with their serialized payloads.
pub async fn serialize_all_responses(
    responses: &[ResponseContext],
    ctx: &SourceContext,
) -> SerializeResult<Vec<SerializedContext>> {
    let mut serialized = Vec::with_capacity(responses.len());
    for context in responses {
        let payload = serialize_response(&context.request, &context.response, ctx).await?;
        serialized.push(SerializedContext {
            request: context.request.clone(),
            response: Some(context.response.clone()),
            serialized: payload,
        });
    }
    Ok(serialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::resolve::validate;
    use crate::testing::CollectingReporter;
    use crate::types::request::RequestConfig;
    use serde_json::json;
    use std::sync::Arc;

    fn ctx_with_reporter() -> (SourceContext, Arc<CollectingReporter>) {
        let reporter = Arc::new(CollectingReporter::new());
        (SourceContext::new("test", reporter.clone()), reporter)
    }

    fn entry_point_descriptor(path: &str) -> RequestDescriptor {
        validate(
            RequestConfig::named("repo")
                .with_endpoint("https://api.example.com/".parse().unwrap())
                .with_entry_point(path),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn entry_point_extracts_substructure() {
        let descriptor = entry_point_descriptor("data.items");
        let response = FetchResponse::from_data(json!({
            "data": {"items": [{"id": 1, "full-name": "x/y"}]}
        }));
        let (ctx, reporter) = ctx_with_reporter();

        let payload = serialize_response(&descriptor, &response, &ctx)
            .await
            .unwrap();
        assert_eq!(payload, json!([{"id": 1, "full-name": "x/y"}]));
        assert!(reporter.warnings().is_empty());
    }

    #[tokio::test]
    async fn missing_entry_point_warns_and_falls_back() {
        let descriptor = entry_point_descriptor("data.nope");
        let body = json!({"data": {"items": []}});
        let response = FetchResponse::from_data(body.clone());
        let (ctx, reporter) = ctx_with_reporter();

        let payload = serialize_response(&descriptor, &response, &ctx)
            .await
            .unwrap();
        assert_eq!(payload, body);
        let warnings = reporter.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("data.nope"));
    }

    #[tokio::test]
    async fn whole_body_passes_through() {
        let descriptor = validate(
            RequestConfig::named("repo")
                .with_endpoint("https://api.example.com/".parse().unwrap()),
        )
        .unwrap();
        let body = json!({"anything": true});
        let response = FetchResponse::from_data(body.clone());
        let (ctx, _) = ctx_with_reporter();

        let payload = serialize_response(&descriptor, &response, &ctx)
            .await
            .unwrap();
        assert_eq!(payload, body);
    }

    #[test]
    fn walk_path_indexes_arrays() {
        let value = json!({"a": [{"b": 42}]});
        let segments = vec!["a".to_string(), "0".to_string(), "b".to_string()];
        assert_eq!(walk_path(&value, &segments), Some(&json!(42)));

        let bad = vec!["a".to_string(), "x".to_string()];
        assert_eq!(walk_path(&value, &bad), None);
    }
}
