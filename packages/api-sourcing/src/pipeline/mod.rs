//! Pipeline orchestration.
//!
//! Sequences resolution → (request cache) → fetch fan-out → per-request
//! serialization → optional aggregate serialization → materialization.
//! Resolution runs once per build and is shared by every later phase;
//! fetching and sourcing may run several times against the same resolved
//! list. Any fatal error aborts record emission for the instance; records
//! already emitted are not rolled back (the host build cache is the unit
//! of consistency).

pub mod cache;
pub mod fetch;
pub mod materialize;
pub mod resolve;
pub mod serialize;

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info};

use crate::error::Result;
use crate::fetchers::HttpFetcher;
use crate::traits::host::{BuildCache, RecordStore, Reporter, TypeRegistry};
use crate::types::config::SourceOptions;
use crate::types::context::SourceContext;
use crate::types::request::RequestDescriptor;
use crate::types::response::SerializedContext;
use crate::types::schema::TypeSchema;

pub use cache::RequestCache;
pub use fetch::FetchOutcome;

/// Result of one sourcing run.
#[derive(Debug, Clone, Default)]
pub struct SourceSummary {
    /// Number of resolved request descriptors.
    pub requests_resolved: usize,

    /// Number of records handed to the host store.
    pub records_created: usize,

    /// Names of requests dropped under the lenient failure policy.
    pub dropped: Vec<String>,
}

impl SourceSummary {
    /// Whether every resolved request produced data.
    pub fn is_complete(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// The sourcing pipeline for one configured instance.
///
/// Generic over the host build cache and record store; diagnostics flow
/// through the supplied [`Reporter`]. The resolved request list is held in
/// a per-build registry inside the pipeline value itself, so nothing
/// leaks across instances or builds.
pub struct Pipeline<C: BuildCache, S: RecordStore> {
    options: SourceOptions,
    ctx: SourceContext,
    request_cache: RequestCache<C>,
    store: Arc<S>,
    http: HttpFetcher,
    registry: RwLock<Option<Arc<Vec<RequestDescriptor>>>>,
}

impl<C: BuildCache, S: RecordStore> Pipeline<C, S> {
    /// Assemble a pipeline from its host collaborators.
    pub fn new(
        options: SourceOptions,
        cache: Arc<C>,
        store: Arc<S>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let ctx = SourceContext::new(&options.name, reporter);
        Self {
            options,
            ctx,
            request_cache: RequestCache::new(cache),
            store,
            http: HttpFetcher::new(),
            registry: RwLock::new(None),
        }
    }

    /// Use a custom HTTP fetcher (client settings, timeouts).
    pub fn with_http(mut self, http: HttpFetcher) -> Self {
        self.http = http;
        self
    }

    /// The per-instance context.
    pub fn context(&self) -> &SourceContext {
        &self.ctx
    }

    /// Resolve the request list, consulting the request cache first, and
    /// register it for the rest of the build. Idempotent within a build.
    pub async fn init(&self) -> Result<()> {
        self.descriptors()
            .await
            .map(|_| ())
            .inspect_err(|err| self.log_fatal(err))
    }

    fn log_fatal(&self, err: &crate::error::SourceError) {
        error!(instance = self.ctx.instance(), error = %err, "sourcing aborted");
    }

    async fn descriptors(&self) -> Result<Arc<Vec<RequestDescriptor>>> {
        if let Some(existing) = self.registry.read().await.as_ref() {
            return Ok(existing.clone());
        }

        let resolved = match self.request_cache.get(&self.options, &self.ctx).await? {
            Some(cached) => cached,
            None => {
                let resolved = resolve::resolve(&self.options, &self.ctx).await?;
                self.request_cache
                    .put(&self.options, &resolved, &self.ctx)
                    .await;
                resolved
            }
        };

        let shared = Arc::new(resolved);
        *self.registry.write().await = Some(shared.clone());
        Ok(shared)
    }

    /// Run one sourcing pass: fetch, serialize, aggregate, materialize.
    ///
    /// May be called multiple times per build; each pass reuses the
    /// resolved request list.
    pub async fn source(&self) -> Result<SourceSummary> {
        self.run_source()
            .await
            .inspect_err(|err| self.log_fatal(err))
    }

    async fn run_source(&self) -> Result<SourceSummary> {
        let descriptors = self.descriptors().await?;
        info!(
            instance = self.ctx.instance(),
            requests = descriptors.len(),
            "sourcing records"
        );

        let outcome = fetch::execute_all(&descriptors, &self.http, &self.ctx).await?;

        // Per-request serialization always runs, even when the aggregate
        // step replaces its output: entry-point warnings still fire and
        // a failing custom serializer still aborts.
        let per_request = serialize::serialize_all_responses(&outcome.responses, &self.ctx).await?;

        let contexts: Vec<SerializedContext> = match serialize::aggregate(
            &self.options,
            descriptors.len(),
            &outcome.responses,
            &self.ctx,
        )
        .await?
        {
            Some(combined) => {
                let synthetic = resolve::validate(self.options.as_request())?;
                vec![SerializedContext {
                    request: synthetic,
                    response: None,
                    serialized: combined,
                }]
            }
            None => per_request,
        };

        let mut records_created = 0;
        for context in &contexts {
            let records = materialize::materialize(
                &context.request,
                &context.serialized,
                self.store.as_ref(),
                &self.ctx,
            )
            .await?;
            records_created += records.len();
        }

        let summary = SourceSummary {
            requests_resolved: descriptors.len(),
            records_created,
            dropped: outcome.dropped,
        };
        info!(
            instance = self.ctx.instance(),
            records = summary.records_created,
            dropped = summary.dropped.len(),
            "sourcing complete"
        );
        Ok(summary)
    }

    /// Register type schemas with the host, independent of record
    /// emission. With `serialize_all` configured the instance emits one
    /// synthetic record set, so only the options-level schema applies.
    pub async fn register_schemas(&self, registry: &dyn TypeRegistry) -> Result<()> {
        self.register_schemas_inner(registry)
            .await
            .inspect_err(|err| self.log_fatal(err))
    }

    async fn register_schemas_inner(&self, registry: &dyn TypeRegistry) -> Result<()> {
        let descriptors = if self.options.serialize_all.is_some() {
            Arc::new(vec![resolve::validate(self.options.as_request())?])
        } else {
            self.descriptors().await?
        };

        for request in descriptors.iter() {
            let definition = match request.schema() {
                Some(TypeSchema::Static(definition)) => definition.clone(),
                Some(TypeSchema::Computed(provider)) => provider.schema(request, &self.ctx),
                None => continue,
            };
            registry
                .create_types(&definition)
                .map_err(crate::error::SourceError::Schema)?;
        }
        Ok(())
    }
}
