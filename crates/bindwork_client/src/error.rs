//! Errors returned by the binding layer.

use thiserror::Error;

use crate::lifecycle::Lifecycle;

/// Errors surfaced by the binding layer.
///
/// None of these are transient: each one points at a wiring mistake in the
/// caller, so nothing in this crate retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A model does not satisfy the requirement registered for its key.
    #[error("model at key \"{key}\" does not satisfy required type {expected}")]
    ModelTypeMismatch { key: String, expected: String },

    /// The wrapped instance was requested without `with_ref` enabled.
    #[error("ref access requires the with_ref option to be enabled")]
    RefDisabled,

    /// A hook needed a [`ModelProvider`](crate::ModelProvider) above it and found none.
    #[error("no ModelProvider found in the context scope; wrap this component in a ModelProvider")]
    MissingProvider,

    /// An update reached an instance that is not mounted.
    #[error("component instance is not mounted (lifecycle: {state:?})")]
    NotMounted { state: Lifecycle },

    /// Bind options could not be parsed.
    #[error("invalid bind options: {0}")]
    Config(String),
}
