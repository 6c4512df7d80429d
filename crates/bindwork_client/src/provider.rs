//! Publishes models to the connected components below it.

use tracing::trace;

use crate::context::{ContextScope, ModelContext};
use crate::mapping::ModelMapping;

/// Provider that makes a mapping of models available to its child.
///
/// This should wrap the part of the tree whose connected components read
/// models from context rather than receiving them directly.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use bindwork_client::{ContextScope, ModelMapping, ModelProvider, use_models};
/// use bindwork_common::AttributeModel;
///
/// let provider = ModelProvider::new(
///     ModelMapping::new().with("user", Arc::new(AttributeModel::new())),
/// );
///
/// let mut scope = ContextScope::new();
/// let keys = provider.render(&mut scope, |scope| {
///     use_models(scope).map(|models| models.len())
/// });
/// assert_eq!(keys, Ok(1));
/// ```
#[derive(Clone, Debug)]
pub struct ModelProvider {
    context: ModelContext,
}

impl ModelProvider {
    pub fn new(models: ModelMapping) -> Self {
        Self {
            context: ModelContext::new(models),
        }
    }

    pub fn models(&self) -> &ModelMapping {
        self.context.models()
    }

    /// Render exactly one child with this provider's models in scope.
    pub fn render<R, F>(&self, scope: &mut ContextScope, child: F) -> R
    where
        F: FnOnce(&mut ContextScope) -> R,
    {
        trace!("ModelProvider rendering child with {} model key(s)", self.models().len());
        scope.with_provided(self.context.clone(), child)
    }
}
