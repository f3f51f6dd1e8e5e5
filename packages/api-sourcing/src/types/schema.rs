//! Type-schema definitions for the host registry.

use std::fmt;
use std::sync::Arc;

use crate::types::context::SourceContext;
use crate::types::request::RequestDescriptor;

/// Compute a schema definition from a resolved request.
pub trait SchemaProvider: Send + Sync {
    /// Produce the type definition for this request.
    fn schema(&self, request: &RequestDescriptor, ctx: &SourceContext) -> String;
}

/// A static or computed type-schema definition.
#[derive(Clone)]
pub enum TypeSchema {
    /// Fixed definition text.
    Static(String),

    /// Definition computed per request at registration time.
    Computed(Arc<dyn SchemaProvider>),
}

impl TypeSchema {
    /// Build a static schema.
    pub fn fixed(definition: impl Into<String>) -> Self {
        TypeSchema::Static(definition.into())
    }
}

impl fmt::Debug for TypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSchema::Static(definition) => f.debug_tuple("Static").field(definition).finish(),
            TypeSchema::Computed(_) => write!(f, "Computed"),
        }
    }
}
