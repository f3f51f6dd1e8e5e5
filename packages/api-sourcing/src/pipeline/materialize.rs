//! Record materialization: turn serialized payloads into normalized,
//! content-addressed records and hand them to the host store.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, SourceError};
use crate::keys::{camel_case, normalize_key, type_name};
use crate::traits::host::RecordStore;
use crate::types::context::SourceContext;
use crate::types::record::EmittedRecord;
use crate::types::request::RequestDescriptor;

/// Materialize one serialized payload into emitted records.
///
/// An object payload is a single entry; an array yields one entry per
/// element. Entries that are not objects (primitives, nested arrays) are
/// wrapped under the request's `list_key`, falling back to its name.
/// Malformed entries normalize to a best-effort shape rather than
/// failing; only the host store can reject a record.
pub async fn materialize<S: RecordStore + ?Sized>(
    request: &RequestDescriptor,
    payload: &Value,
    store: &S,
    ctx: &SourceContext,
) -> Result<Vec<EmittedRecord>> {
    let entries: Vec<Value> = match payload {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    };

    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        let record = build_record(request, entry, store, ctx);
        store
            .create(record.clone())
            .await
            .map_err(SourceError::Store)?;
        records.push(record);
    }

    debug!(
        instance = ctx.instance(),
        request = request.name(),
        count = records.len(),
        "materialized records"
    );
    Ok(records)
}

fn build_record<S: RecordStore + ?Sized>(
    request: &RequestDescriptor,
    entry: Value,
    store: &S,
    ctx: &SourceContext,
) -> EmittedRecord {
    let data: Map<String, Value> = match entry {
        Value::Object(map) => normalize_entry(map, ctx),
        other => {
            // Primitive or nested-array entry: wrap under the list key.
            let wrap_key = request
                .list_key()
                .unwrap_or_else(|| request.name())
                .to_string();
            Map::from_iter([(wrap_key, other)])
        }
    };

    let fields = Value::Object(data.clone());
    let digest = store.content_digest(&fields);
    let content = serde_json::to_string(&fields).unwrap_or_default();

    let prefix = request.type_prefix().unwrap_or_default();
    let seed = camel_case(&format!("{prefix}-{}-{digest}", request.name()));

    EmittedRecord {
        id: store.node_id(&seed),
        record_type: type_name(request.type_prefix(), request.name()),
        fields: data,
        content,
        content_digest: digest,
        media_type: EmittedRecord::MEDIA_TYPE.to_string(),
    }
}

/// Normalize every top-level key, logging renames at verbose level.
fn normalize_entry(map: Map<String, Value>, ctx: &SourceContext) -> Map<String, Value> {
    let mut normalized = Map::new();
    for (key, value) in map {
        let valid = normalize_key(&key);
        if valid != key {
            ctx.verbose(&format!(
                "object key `{key}` breaks naming convention, renamed to `{valid}`"
            ));
        }
        normalized.insert(valid, value);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::resolve::validate;
    use crate::stores::MemoryStore;
    use crate::testing::CollectingReporter;
    use crate::types::request::RequestConfig;
    use serde_json::json;
    use std::sync::Arc;

    fn descriptor(name: &str) -> RequestDescriptor {
        validate(
            RequestConfig::named(name)
                .with_endpoint("https://api.example.com/".parse().unwrap()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn object_payload_yields_one_record() {
        let store = MemoryStore::new();
        let ctx = SourceContext::new("test", Arc::new(CollectingReporter::new()));

        let records = materialize(
            &descriptor("repo"),
            &json!({"full-name": "x/y", "stars": 10}),
            &store,
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_type, "ExternalRepo");
        assert_eq!(records[0].fields.get("full_name"), Some(&json!("x/y")));
        assert_eq!(store.record_count(), 1);
    }

    #[tokio::test]
    async fn array_payload_yields_one_record_per_element() {
        let store = MemoryStore::new();
        let ctx = SourceContext::new("test", Arc::new(CollectingReporter::new()));

        let records = materialize(
            &descriptor("repo"),
            &json!([{"id": 1}, {"id": 2}, {"id": 3}]),
            &store,
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 3);
        // Upstream `id` collides with the reserved field set.
        assert!(records[0].fields.contains_key("alt_id"));
    }

    #[tokio::test]
    async fn primitive_entries_are_wrapped_under_list_key() {
        let store = MemoryStore::new();
        let ctx = SourceContext::new("test", Arc::new(CollectingReporter::new()));

        let with_list_key = validate(
            RequestConfig::named("tags")
                .with_endpoint("https://api.example.com/".parse().unwrap())
                .with_list_key("tagValues"),
        )
        .unwrap();

        let records = materialize(&with_list_key, &json!(["a", "b"]), &store, &ctx)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fields.get("tagValues"), Some(&json!("a")));

        // Without a list key the request name wraps the value.
        let records = materialize(&descriptor("plain"), &json!(42), &store, &ctx)
            .await
            .unwrap();
        assert_eq!(records[0].fields.get("plain"), Some(&json!(42)));
    }

    #[tokio::test]
    async fn identical_payloads_yield_identical_identity() {
        let store = MemoryStore::new();
        let ctx = SourceContext::new("test", Arc::new(CollectingReporter::new()));
        let payload = json!({"full-name": "x/y", "stars": 10});

        let first = materialize(&descriptor("repo"), &payload, &store, &ctx)
            .await
            .unwrap();
        let second = materialize(&descriptor("repo"), &payload, &store, &ctx)
            .await
            .unwrap();

        assert_eq!(first[0].id, second[0].id);
        assert_eq!(first[0].content_digest, second[0].content_digest);
        // Equal identity replaces, never duplicates.
        assert_eq!(store.record_count(), 1);
    }

    #[tokio::test]
    async fn renames_are_reported_verbose() {
        let store = MemoryStore::new();
        let reporter = Arc::new(CollectingReporter::new());
        let ctx = SourceContext::new("test", reporter.clone());

        materialize(&descriptor("repo"), &json!({"full-name": "x/y"}), &store, &ctx)
            .await
            .unwrap();

        let verbose = reporter.verbose_messages();
        assert!(verbose.iter().any(|m| m.contains("full-name")));
    }
}
