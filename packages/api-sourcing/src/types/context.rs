//! Per-instance context threaded through the pipeline.

use std::fmt;
use std::sync::Arc;

use crate::keys::PIPELINE_NAME;
use crate::traits::host::Reporter;

/// Context handed to every pipeline phase and operator callable.
///
/// Carries the instance label and the host reporter. One context exists
/// per configured plugin instance per build; it holds no mutable state.
#[derive(Clone)]
pub struct SourceContext {
    instance: String,
    reporter: Arc<dyn Reporter>,
}

impl SourceContext {
    /// Build a context for a named instance.
    pub fn new(name: &str, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            instance: format!("{PIPELINE_NAME} {name}"),
            reporter,
        }
    }

    /// The instance label, e.g. `api-sourcing github`.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// The host reporter.
    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    /// Emit an instance-scoped warning.
    pub fn warn(&self, message: &str) {
        self.reporter.warn(&format!("{} {message}", self.instance));
    }

    /// Emit an instance-scoped verbose diagnostic.
    pub fn verbose(&self, message: &str) {
        self.reporter
            .verbose(&format!("{} {message}", self.instance));
    }
}

impl fmt::Debug for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceContext")
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::host::TracingReporter;

    #[test]
    fn instance_label_includes_pipeline_name() {
        let ctx = SourceContext::new("github", Arc::new(TracingReporter));
        assert_eq!(ctx.instance(), "api-sourcing github");
    }
}
