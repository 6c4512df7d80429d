//! # Bindwork Client
//!
//! Bind components to externally owned, event-emitting models.
//!
//! This library provides a provider that makes a mapping of named models
//! available to descendants, and a binder that subscribes a wrapped component
//! to those models' events, derives props from their current state and
//! re-renders it on every observed event.
//!
//! ## Features
//!
//! - **Lifecycle Management**: subscribe on mount, diff subscriptions by model
//!   identity on every update, unsubscribe everything on unmount
//! - **Event Selection**: per-key event lists, or no listening at all
//! - **Debouncing**: collapse bursts of events into one trailing render
//! - **Type Requirements**: fail fast when a model is not of the required kind
//! - **Re-entrancy Safety**: unmounting during an event dispatch is a silent no-op
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use bindwork_client::{
//!     BindOptions, Component, ConnectedProps, ContextScope, ModelMapping, ModelProvider,
//!     Props, connect_models,
//! };
//! use bindwork_common::AttributeModel;
//! use serde_json::json;
//!
//! struct Greeting;
//!
//! impl Component for Greeting {
//!     type Output = String;
//!
//!     fn render(&mut self, props: &Props) -> String {
//!         let name = props.value("name").and_then(|v| v.as_str()).unwrap_or("nobody");
//!         format!("Hello, {}", name)
//!     }
//! }
//!
//! let user = Arc::new(AttributeModel::from_json(json!({ "name": "Harry" })));
//!
//! let connected = connect_models(
//!     |models: &ModelMapping, _own: &Props| {
//!         let mut props = Props::new();
//!         if let Some(user) = models.get("user") {
//!             props.insert_value("name", user.snapshot()["name"].clone());
//!         }
//!         props
//!     },
//!     BindOptions::default(),
//! )
//! .wrap(|| Greeting);
//!
//! let provider = ModelProvider::new(ModelMapping::new().with("user", user.clone()));
//! let mut scope = ContextScope::new();
//!
//! let instance = provider
//!     .render(&mut scope, |scope| connected.mount(scope, ConnectedProps::new()))
//!     .unwrap();
//! assert_eq!(instance.output().as_deref(), Some("Hello, Harry"));
//!
//! user.set("name", json!("Robert"));
//! assert_eq!(instance.output().as_deref(), Some("Hello, Robert"));
//! ```

// Module declarations
mod config;
mod connect;
mod context;
mod debounce;
mod error;
mod events;
mod hooks;
mod lifecycle;
mod mapping;
mod props;
mod provider;
mod registry;
mod resolve;
mod subscription;
mod traits;

#[cfg(feature = "leptos")]
pub mod leptos_provider;

// Re-exports
pub use config::{BindOptions, DebounceSetting, EventSelection};
pub use connect::{
    Connected, ConnectedComponent, ConnectedHandle, ConnectedProps, Connector, WrappedInstance,
    connect_models,
};
pub use context::{ContextScope, ModelContext};
pub use debounce::{Debouncer, ManualScheduler, Scheduler, ThreadScheduler, TimerId, TimerTask};
pub use error::BindError;
pub use events::{CATCH_ALL_EVENT, resolve_event_names};
pub use hooks::{use_model, use_model_context, use_model_snapshots, use_models};
pub use lifecycle::Lifecycle;
pub use mapping::ModelMapping;
pub use props::{Callback, MODELS_PROP, Prop, Props};
pub use provider::ModelProvider;
pub use registry::{ModelRequirement, ModelTypes, ModelTypesBuilder};
pub use resolve::resolve_models;
pub use subscription::{Subscription, Subscriptions, SyncReport};
pub use traits::{Component, MapModelsToProps, SnapshotProjection};

// Re-export the model contract for convenience
pub use bindwork_common::{Model, ModelEvent, ModelRef};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// Bookkeeping locks are never held across listener, projection or render
/// callbacks, so a poisoned one still guards consistent state. The target
/// lock is the exception: it is held while the target renders, and the
/// render path only ever try-locks it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
