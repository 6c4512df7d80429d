//! The binder: wrap a component so it re-renders from model events.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError, Weak};

use bindwork_common::{Listener, ModelEvent};
use tracing::{debug, trace};

use crate::config::BindOptions;
use crate::context::{ContextScope, ModelContext};
use crate::debounce::{Debouncer, Scheduler, ThreadScheduler};
use crate::error::BindError;
use crate::lifecycle::Lifecycle;
use crate::lock;
use crate::mapping::ModelMapping;
use crate::props::Props;
use crate::resolve::resolve_models;
use crate::subscription::Subscriptions;
use crate::traits::{Component, MapModelsToProps, SnapshotProjection};

/// Create a [`Connector`] from a projection and options.
///
/// # Example
///
/// ```rust
/// use bindwork_client::{BindOptions, Component, Props, SnapshotProjection, connect_models};
///
/// struct Dump;
///
/// impl Component for Dump {
///     type Output = String;
///
///     fn render(&mut self, props: &Props) -> String {
///         props.to_json().to_string()
///     }
/// }
///
/// let connected = connect_models(SnapshotProjection, BindOptions::new().ignore("coll"))
///     .wrap(|| Dump);
/// assert_eq!(connected.display_name(), "connect_models(Dump)");
/// ```
pub fn connect_models<M: MapModelsToProps>(projection: M, options: BindOptions) -> Connector {
    Connector {
        projection: Arc::new(projection),
        options: Arc::new(options),
    }
}

/// A configured binder, ready to wrap target components.
#[derive(Clone)]
pub struct Connector {
    projection: Arc<dyn MapModelsToProps>,
    options: Arc<BindOptions>,
}

impl Connector {
    /// A binder using [`SnapshotProjection`].
    pub fn with_default_projection(options: BindOptions) -> Self {
        connect_models(SnapshotProjection, options)
    }

    pub fn options(&self) -> &BindOptions {
        &self.options
    }

    /// Wrap a target. `target` builds one target instance per mount.
    pub fn wrap<C, F>(&self, target: F) -> ConnectedComponent<C>
    where
        C: Component,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let full_name = std::any::type_name::<C>();
        let short_name = full_name.rsplit("::").next().unwrap_or(full_name);

        ConnectedComponent {
            projection: self.projection.clone(),
            options: self.options.clone(),
            factory: Arc::new(target),
            display_name: format!("connect_models({})", short_name),
        }
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("options", &self.options)
            .finish()
    }
}

/// Inputs of a connected component: models supplied directly plus
/// pass-through props.
#[derive(Clone, Debug, Default)]
pub struct ConnectedProps {
    /// Models that take priority over the provider's models, key by key.
    pub models: Option<ModelMapping>,
    /// Props forwarded to the target; they win over derived props.
    pub props: Props,
}

impl ConnectedProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models(mut self, models: ModelMapping) -> Self {
        self.models = Some(models);
        self
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }
}

/// A wrapped component definition. Each [`ConnectedComponent::mount`]
/// creates an independent [`Connected`] instance.
pub struct ConnectedComponent<C: Component> {
    projection: Arc<dyn MapModelsToProps>,
    options: Arc<BindOptions>,
    factory: Arc<dyn Fn() -> C + Send + Sync>,
    display_name: String,
}

impl<C: Component> Clone for ConnectedComponent<C> {
    fn clone(&self) -> Self {
        Self {
            projection: self.projection.clone(),
            options: self.options.clone(),
            factory: self.factory.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

impl<C: Component> ConnectedComponent<C> {
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Mount a new instance.
    ///
    /// Resolves the active models (provider models from `scope` overlaid
    /// with `input.models`), validates them, subscribes and renders once.
    ///
    /// # Errors
    ///
    /// Returns `BindError::ModelTypeMismatch` before anything is subscribed
    /// or rendered if a model fails its type requirement.
    pub fn mount(&self, scope: &ContextScope, input: ConnectedProps) -> Result<Connected<C>, BindError> {
        let context = scope.get::<ModelContext>().map(ModelContext::models);
        let models = resolve_models(context, input.models.as_ref(), &self.options.model_types)?;

        let shared = Arc::new_cyclic(|this: &Weak<Shared<C>>| {
            let handler: Listener = {
                let this = this.clone();
                Arc::new(move |event: &ModelEvent| {
                    if let Some(shared) = this.upgrade() {
                        shared.on_model_event(event);
                    }
                })
            };

            let debouncer = self.options.debounce.wait().map(|wait| {
                let scheduler: Arc<dyn Scheduler> = self
                    .options
                    .scheduler
                    .clone()
                    .unwrap_or_else(|| Arc::new(ThreadScheduler::new()));
                Debouncer::new(wait, scheduler)
            });

            Shared {
                this: this.clone(),
                display_name: self.display_name.clone(),
                projection: self.projection.clone(),
                options: self.options.clone(),
                handler,
                active: AtomicBool::new(false),
                rendering: AtomicBool::new(false),
                rerender: AtomicBool::new(false),
                stale: AtomicBool::new(false),
                renders: AtomicUsize::new(0),
                state: Mutex::new(InstanceState {
                    lifecycle: Lifecycle::Created,
                    models: ModelMapping::new(),
                    own: Props::new(),
                    subscriptions: Subscriptions::new(),
                    debouncer,
                }),
                target: Mutex::new((self.factory)()),
                view: Mutex::new(None),
            }
        });

        shared.mount(models, input.props);
        Ok(Connected { shared })
    }
}

impl<C: Component> fmt::Debug for ConnectedComponent<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectedComponent")
            .field("display_name", &self.display_name)
            .field("options", &self.options)
            .finish()
    }
}

struct InstanceState {
    lifecycle: Lifecycle,
    models: ModelMapping,
    own: Props,
    subscriptions: Subscriptions,
    debouncer: Option<Debouncer>,
}

struct Rendered<O> {
    props: Props,
    output: O,
}

struct Shared<C: Component> {
    this: Weak<Shared<C>>,
    display_name: String,
    projection: Arc<dyn MapModelsToProps>,
    options: Arc<BindOptions>,
    // One handler per instance, registered for every subscribed event.
    handler: Listener,
    // Cleared at the start of unmount; every render path checks it last.
    active: AtomicBool,
    // Set by whichever thread currently owns the render loop.
    rendering: AtomicBool,
    rerender: AtomicBool,
    // A render was skipped because a `WrappedInstance` held the target.
    stale: AtomicBool,
    renders: AtomicUsize,
    state: Mutex<InstanceState>,
    target: Mutex<C>,
    view: Mutex<Option<Rendered<C::Output>>>,
}

impl<C: Component> Shared<C> {
    fn mount(&self, models: ModelMapping, own: Props) {
        {
            let mut state = lock(&self.state);
            state.lifecycle.advance(Lifecycle::Mounting);
            let report = state
                .subscriptions
                .sync(&models, &self.options.events, &self.handler);
            state.models = models;
            state.own = own;
            state.lifecycle.advance(Lifecycle::Mounted);
            debug!(
                "[{}] Mounted with {} subscription(s) {:?}",
                self.display_name,
                report.attached.len(),
                report.attached
            );
        }

        self.active.store(true, Ordering::Release);
        self.render();
    }

    fn update(&self, models: ModelMapping, own: Props) -> Result<(), BindError> {
        {
            let mut state = lock(&self.state);
            if !state.lifecycle.is_mounted() {
                return Err(BindError::NotMounted {
                    state: state.lifecycle,
                });
            }
            let report = state
                .subscriptions
                .sync(&models, &self.options.events, &self.handler);
            state.models = models;
            state.own = own;
            trace!(
                "[{}] Updated: attached {:?}, detached {:?}",
                self.display_name, report.attached, report.detached
            );
        }

        self.render();
        Ok(())
    }

    fn unmount(&self) -> bool {
        let mut state = lock(&self.state);
        if !state.lifecycle.advance(Lifecycle::Unmounting) {
            return false;
        }

        self.active.store(false, Ordering::Release);
        if let Some(debouncer) = state.debouncer.as_mut() {
            debouncer.cancel();
        }
        let detached = state.subscriptions.detach_all();
        state.lifecycle.advance(Lifecycle::Unmounted);
        debug!("[{}] Unmounted, detached {} subscription(s)", self.display_name, detached);
        true
    }

    fn on_model_event(&self, event: &ModelEvent) {
        // A listener earlier in the same dispatch may have unmounted us.
        if !self.active.load(Ordering::Acquire) {
            trace!("[{}] Ignoring '{}' after unmount", self.display_name, event.name);
            return;
        }

        let deferred = {
            let mut state = lock(&self.state);
            match state.debouncer.as_mut() {
                Some(debouncer) => {
                    let this = self.this.clone();
                    debouncer.schedule(move |generation| {
                        Box::new(move || {
                            if let Some(shared) = this.upgrade() {
                                shared.fire_debounced(generation);
                            }
                        })
                    });
                    true
                }
                None => false,
            }
        };

        trace!(
            "[{}] '{}' observed ({})",
            self.display_name,
            event.name,
            if deferred { "debounced" } else { "immediate" }
        );
        if !deferred {
            self.render();
        }
    }

    fn fire_debounced(&self, generation: u64) {
        let due = lock(&self.state)
            .debouncer
            .as_mut()
            .is_some_and(|debouncer| debouncer.settle(generation));
        if due {
            self.render();
        }
    }

    /// Derive props and render the target.
    ///
    /// A render requested while one is running (from inside the projection
    /// or the target, or from another thread) is handed to the running loop,
    /// which performs one extra pass for it. The request flag is re-checked
    /// after the loop is released, so a request arriving in between is
    /// picked up by whoever wins the loop next.
    fn render(&self) {
        self.rerender.store(true, Ordering::SeqCst);
        while self
            .rendering
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            while self.rerender.swap(false, Ordering::SeqCst) {
                self.render_pass();
            }
            self.rendering.store(false, Ordering::SeqCst);
            if !self.rerender.load(Ordering::SeqCst) {
                break;
            }
        }
    }

    fn try_target(&self) -> Option<MutexGuard<'_, C>> {
        match self.target.try_lock() {
            Ok(target) => Some(target),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    fn render_pass(&self) {
        if !self.active.load(Ordering::Acquire) {
            return;
        }

        let (models, own) = {
            let state = lock(&self.state);
            (state.models.clone(), state.own.clone())
        };
        let props = self.projection.map(&models, &own).merged_with(&own);

        if !self.active.load(Ordering::Acquire) {
            return;
        }
        let mut target = match self.try_target() {
            Some(target) => target,
            None => {
                // Mark first, then retry: a holder releasing in between sees the mark.
                self.stale.store(true, Ordering::SeqCst);
                match self.try_target() {
                    Some(target) => {
                        self.stale.store(false, Ordering::SeqCst);
                        target
                    }
                    None => {
                        trace!("[{}] Target busy, render deferred", self.display_name);
                        return;
                    }
                }
            }
        };
        let output = target.render(&props);
        drop(target);
        *lock(&self.view) = Some(Rendered { props, output });
        let count = self.renders.fetch_add(1, Ordering::AcqRel) + 1;
        trace!("[{}] Rendered (#{})", self.display_name, count);
    }
}

/// A mounted connected component instance.
///
/// Dropping the instance unmounts it.
pub struct Connected<C: Component> {
    shared: Arc<Shared<C>>,
}

impl<C: Component> Connected<C> {
    /// Re-resolve models from `scope` and `input`, re-diff subscriptions
    /// and re-render.
    ///
    /// # Errors
    ///
    /// Returns `BindError::ModelTypeMismatch` (leaving subscriptions
    /// untouched) or `BindError::NotMounted` after unmount.
    pub fn update(&self, scope: &ContextScope, input: ConnectedProps) -> Result<(), BindError> {
        let context = scope.get::<ModelContext>().map(ModelContext::models);
        let models = resolve_models(
            context,
            input.models.as_ref(),
            &self.shared.options.model_types,
        )?;
        self.shared.update(models, input.props)
    }

    /// Cancel any pending debounced render and detach every listener.
    /// Calling it again is a no-op. Returns whether this call unmounted.
    pub fn unmount(&self) -> bool {
        self.shared.unmount()
    }

    /// A weak handle that can unmount this instance from inside a listener.
    pub fn handle(&self) -> ConnectedHandle<C> {
        ConnectedHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        lock(&self.shared.state).lifecycle
    }

    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Latest render output.
    pub fn output(&self) -> Option<C::Output> {
        lock(&self.shared.view)
            .as_ref()
            .map(|rendered| rendered.output.clone())
    }

    /// Props passed to the latest render.
    pub fn props(&self) -> Option<Props> {
        lock(&self.shared.view)
            .as_ref()
            .map(|rendered| rendered.props.clone())
    }

    pub fn render_count(&self) -> usize {
        self.shared.renders.load(Ordering::Acquire)
    }

    /// The active model mapping.
    pub fn models(&self) -> ModelMapping {
        lock(&self.shared.state).models.clone()
    }

    /// Keys with a live subscription, sorted.
    pub fn subscribed_keys(&self) -> Vec<String> {
        lock(&self.shared.state).subscriptions.keys()
    }

    /// Event names subscribed under `key`.
    pub fn subscribed_events(&self, key: &str) -> Option<Vec<String>> {
        lock(&self.shared.state)
            .subscriptions
            .get(key)
            .map(|subscription| subscription.events().to_vec())
    }

    /// Whether a debounced render is waiting for its timer.
    pub fn has_pending_render(&self) -> bool {
        lock(&self.shared.state)
            .debouncer
            .as_ref()
            .is_some_and(|debouncer| debouncer.is_pending())
    }

    /// The wrapped target instance.
    ///
    /// # Errors
    ///
    /// Returns `BindError::RefDisabled` unless the binder was configured
    /// with `with_ref`.
    pub fn wrapped_instance(&self) -> Result<WrappedInstance<C>, BindError> {
        if !self.shared.options.with_ref {
            return Err(BindError::RefDisabled);
        }
        Ok(WrappedInstance {
            shared: self.shared.clone(),
        })
    }

    pub fn display_name(&self) -> &str {
        &self.shared.display_name
    }
}

impl<C: Component> Drop for Connected<C> {
    fn drop(&mut self) {
        self.shared.unmount();
    }
}

impl<C: Component> fmt::Debug for Connected<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connected")
            .field("display_name", &self.shared.display_name)
            .field("lifecycle", &self.lifecycle())
            .field("renders", &self.render_count())
            .finish()
    }
}

/// Access to the target instance of a [`Connected`] component.
///
/// Renders triggered while [`WrappedInstance::with`] holds the target (for
/// example by a target method that sets one of its models) are deferred and
/// run once, right after the closure returns.
pub struct WrappedInstance<C: Component> {
    shared: Arc<Shared<C>>,
}

impl<C: Component> Clone for WrappedInstance<C> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<C: Component> WrappedInstance<C> {
    /// Run `f` with exclusive access to the target.
    pub fn with<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        let result = {
            let mut target = lock(&self.shared.target);
            f(&mut target)
        };
        if self.shared.stale.swap(false, Ordering::SeqCst) {
            self.shared.render();
        }
        result
    }
}

/// Weak reference to a [`Connected`] instance.
pub struct ConnectedHandle<C: Component> {
    shared: Weak<Shared<C>>,
}

impl<C: Component> Clone for ConnectedHandle<C> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<C: Component> ConnectedHandle<C> {
    /// Unmount the instance if it still exists. Returns whether this call
    /// unmounted it.
    pub fn unmount(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.unmount())
    }

    pub fn is_active(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.active.load(Ordering::Acquire))
    }
}
