//! Context values and the scope that carries them down the component tree.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::mapping::ModelMapping;

/// Context value published by a [`ModelProvider`](crate::ModelProvider).
#[derive(Clone, Debug, Default)]
pub struct ModelContext {
    models: ModelMapping,
}

impl ModelContext {
    pub fn new(models: ModelMapping) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &ModelMapping {
        &self.models
    }
}

/// Explicit context tree handed down while rendering.
///
/// Providers push a value for the duration of their child and pop it
/// afterwards; lookups return the nearest value of the requested type. The
/// binder only reads from the scope while mounting and updating, it never
/// keeps a reference to it.
#[derive(Default)]
pub struct ContextScope {
    frames: Vec<Arc<dyn Any + Send + Sync>>,
}

impl ContextScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `value` visible to everything rendered by `child`.
    pub fn with_provided<T, R, F>(&mut self, value: T, child: F) -> R
    where
        T: Any + Send + Sync,
        F: FnOnce(&mut ContextScope) -> R,
    {
        self.frames.push(Arc::new(value));
        let result = child(self);
        self.frames.pop();
        result
    }

    /// The nearest provided value of type `T`.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| (**frame).downcast_ref::<T>())
    }

    /// Number of provided values currently in scope.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Debug for ContextScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextScope")
            .field("depth", &self.depth())
            .finish()
    }
}
