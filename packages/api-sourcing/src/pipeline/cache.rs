//! Persistence of the resolved request list across build runs.
//!
//! Dynamic resolution can be expensive or side-effecting, so the resolved
//! list is written to the host build cache once per resolution and read
//! back on subsequent runs. A cache read failure is fatal (the host cache
//! is required infrastructure); a write failure only warns, since the
//! list already exists in memory.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::CacheError;
use crate::keys::{kebab_case, PIPELINE_NAME};
use crate::types::config::SourceOptions;
use crate::types::context::SourceContext;
use crate::types::request::{
    DataSource, RequestDescriptor, RequestSnapshot, SerializeStrategy,
};
use crate::types::schema::TypeSchema;
use crate::traits::host::BuildCache;

/// Cache key for an instance: kebab-cased pipeline name plus instance
/// name, so two instances of the pipeline never collide.
pub fn cache_key(name: &str) -> String {
    kebab_case(&format!("{PIPELINE_NAME}-{name}"))
}

/// Wrapper over the host [`BuildCache`] storing request snapshots.
pub struct RequestCache<C: BuildCache> {
    cache: Arc<C>,
}

impl<C: BuildCache> RequestCache<C> {
    pub fn new(cache: Arc<C>) -> Self {
        Self { cache }
    }

    /// Look up the resolved request list for an instance.
    ///
    /// Returns `Ok(None)` when the key is absent or when a snapshot
    /// recorded a callable the current options no longer provide; the
    /// caller then re-resolves. Read failures are fatal.
    pub async fn get(
        &self,
        options: &SourceOptions,
        ctx: &SourceContext,
    ) -> Result<Option<Vec<RequestDescriptor>>, CacheError> {
        let key = cache_key(&options.name);

        let value = self
            .cache
            .get(&key)
            .await
            .map_err(|source| CacheError::Read {
                key: key.clone(),
                source,
            })?;

        let Some(value) = value else {
            debug!(instance = ctx.instance(), key, "request cache miss");
            return Ok(None);
        };

        let snapshots: Vec<RequestSnapshot> =
            serde_json::from_value(value).map_err(|source| CacheError::Decode {
                key: key.clone(),
                source,
            })?;

        let mut descriptors = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            match revive(snapshot, options) {
                Some(descriptor) => descriptors.push(descriptor),
                None => {
                    // A callable recorded in the snapshot cannot be
                    // reattached; treat the entry as a miss.
                    ctx.verbose(&format!(
                        "cached request list at `{key}` is not revivable, re-resolving"
                    ));
                    return Ok(None);
                }
            }
        }

        debug!(
            instance = ctx.instance(),
            key,
            count = descriptors.len(),
            "request cache hit"
        );
        Ok(Some(descriptors))
    }

    /// Persist the resolved request list for an instance.
    ///
    /// Failures are warned and swallowed: the resolution that produced
    /// the list already succeeded in memory.
    pub async fn put(
        &self,
        options: &SourceOptions,
        descriptors: &[RequestDescriptor],
        ctx: &SourceContext,
    ) {
        let key = cache_key(&options.name);
        let snapshots: Vec<RequestSnapshot> =
            descriptors.iter().map(|d| d.snapshot()).collect();

        let value = match serde_json::to_value(&snapshots) {
            Ok(value) => value,
            Err(err) => {
                ctx.warn(&format!("unable to encode request list for cache: {err}"));
                return;
            }
        };

        if let Err(source) = self.cache.set(&key, value).await {
            let err = CacheError::Write { key, source };
            ctx.warn(&format!("{err}"));
        }
    }
}

/// Rebuild a descriptor from its snapshot, reattaching callables from the
/// instance options. Returns `None` when a recorded callable is gone.
fn revive(snapshot: RequestSnapshot, options: &SourceOptions) -> Option<RequestDescriptor> {
    let source = if snapshot.custom_fetch {
        DataSource::Custom(options.defaults.fetcher.clone()?)
    } else {
        DataSource::Http {
            endpoint: snapshot.endpoint,
        }
    };

    let strategy = if snapshot.custom_serialize {
        SerializeStrategy::Custom(options.defaults.serializer.clone()?)
    } else if let Some(entry_point) = &snapshot.entry_point {
        SerializeStrategy::EntryPoint(entry_point.segments())
    } else {
        SerializeStrategy::WholeBody
    };

    let schema = if snapshot.computed_schema {
        match options.defaults.schema.clone() {
            Some(schema @ TypeSchema::Computed(_)) => Some(schema),
            _ => return None,
        }
    } else {
        snapshot.static_schema.map(TypeSchema::Static)
    };

    let metadata = match snapshot.metadata {
        Value::Null => Value::Object(Default::default()),
        metadata => metadata,
    };

    Some(RequestDescriptor::new(
        snapshot.name,
        source,
        snapshot.fetch_options,
        strategy,
        snapshot.entry_point,
        metadata,
        schema,
        snapshot.list_key,
        snapshot.type_prefix,
        snapshot.kill_on_request_error,
    ))
}
