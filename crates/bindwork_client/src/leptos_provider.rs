//! Leptos rendition of the model provider.
//!
//! Publishes the same [`ModelContext`] through Leptos' reactive context so
//! Leptos components can read the models a [`ModelProvider`](crate::ModelProvider)
//! would hand to connected components.

use leptos::prelude::*;

use crate::context::ModelContext;
use crate::error::BindError;
use crate::mapping::ModelMapping;

/// Provider component that makes `models` available to its children.
///
/// # Example
///
/// ```rust,ignore
/// use bindwork_client::leptos_provider::{ModelsProvider, use_leptos_models};
///
/// #[component]
/// pub fn App(models: ModelMapping) -> impl IntoView {
///     view! {
///         <ModelsProvider models=models>
///             <UserBadge />
///         </ModelsProvider>
///     }
/// }
/// ```
#[component]
pub fn ModelsProvider(
    /// Models published to descendants
    models: ModelMapping,
    /// Child components
    children: Children,
) -> impl IntoView {
    tracing::trace!("ModelsProvider publishing {} model key(s)", models.len());
    provide_context(ModelContext::new(models));
    children()
}

/// Hook to read the models of the nearest [`ModelsProvider`].
///
/// # Errors
///
/// Returns `BindError::MissingProvider` outside of a `ModelsProvider`.
pub fn use_leptos_models() -> Result<ModelMapping, BindError> {
    use_context::<ModelContext>()
        .map(|context| context.models().clone())
        .ok_or(BindError::MissingProvider)
}
