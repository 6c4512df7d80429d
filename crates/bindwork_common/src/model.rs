//! The model contract.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::events::{Listener, ListenerToken};

/// Contract for event-emitting models that components can bind to.
///
/// Implementations are shared and externally owned. The binder only calls
/// [`Model::on`] / [`Model::off`] for its own registrations and reads
/// [`Model::snapshot`] when deriving props.
///
/// # Kinds
///
/// [`Model::kinds`] lists the kind names a model satisfies, most specific
/// first. A `UserModel` built on top of the generic attribute model reports
/// `["UserModel", "Model"]`, so a requirement for `Model` accepts it too.
pub trait Model: Send + Sync + 'static {
    /// Register `listener` for `event`.
    fn on(&self, event: &str, listener: Listener) -> ListenerToken;

    /// Remove a registration made through [`Model::on`].
    fn off(&self, token: ListenerToken) -> bool;

    /// Plain JSON projection of the current state.
    fn snapshot(&self) -> JsonValue;

    /// Kind lineage, most specific first.
    fn kinds(&self) -> Vec<String>;

    /// Whether this model is (or extends) `kind`.
    fn is_a(&self, kind: &str) -> bool {
        self.kinds().iter().any(|candidate| candidate == kind)
    }

    /// Access to the concrete type, used by projections that need more than
    /// the snapshot.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a model.
pub type ModelRef = Arc<dyn Model>;

/// Identity comparison: true when both handles point at the same model.
pub fn same_model(a: &ModelRef, b: &ModelRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Downcast a shared model to its concrete type.
pub fn downcast_model<T: Model>(model: &ModelRef) -> Option<&T> {
    model.as_any().downcast_ref::<T>()
}
