//! bindwork_common
//!
//! The model contract shared by the bindwork crates. A model is an externally
//! owned, shared entity that emits named events and can produce a plain JSON
//! snapshot of its current state. Components never own models; they only
//! listen to them for as long as they are mounted.
//!
//! This crate exposes:
//!
//! - [`Events`]: an ordered listener table with opaque [`ListenerToken`]s and
//!   a catch-all event ([`ALL_EVENTS`]).
//! - [`Model`] / [`ModelRef`]: the object-safe contract the binder consumes.
//! - [`AttributeModel`]: a JSON attribute bag emitting `change:<attr>` and
//!   `change`.
//! - [`Collection`]: an ordered list of models emitting `add`, `remove`,
//!   `reset` and `update`, forwarding every member event.

mod attributes;
mod collection;
mod events;
mod model;

pub use attributes::AttributeModel;
pub use collection::Collection;
pub use events::{ALL_EVENTS, Events, Listener, ListenerToken, ModelEvent};
pub use model::{Model, ModelRef, downcast_model, same_model};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// No user callback ever runs while one of these locks is held, so the
/// protected bookkeeping is never left half-updated.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
