//! Listener bookkeeping for the models a connected instance observes.

use std::collections::{BTreeSet, HashMap};

use bindwork_common::{Listener, ListenerToken, ModelRef, same_model};
use tracing::{debug, trace, warn};

use crate::config::EventSelection;
use crate::events::resolve_event_names;
use crate::mapping::ModelMapping;

/// Listeners one instance holds on one model.
pub struct Subscription {
    model: ModelRef,
    events: Vec<String>,
    tokens: Vec<ListenerToken>,
}

impl Subscription {
    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    /// Event names subscribed, in subscription order.
    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn tokens(&self) -> &[ListenerToken] {
        &self.tokens
    }
}

/// Keys attached and detached by one [`Subscriptions::sync`] pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub attached: Vec<String>,
    pub detached: Vec<String>,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.attached.is_empty() && self.detached.is_empty()
    }
}

/// The set of live subscriptions of one instance, keyed by model key.
///
/// After every [`Subscriptions::sync`] the set holds exactly one entry per
/// key of the mapping that has a model, bound to that model, with the event
/// names resolved for the key.
#[derive(Default)]
pub struct Subscriptions {
    active: HashMap<String, Subscription>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen to `events` on `model` under `key` with `handler`.
    ///
    /// Any subscription previously held under `key` is detached first.
    pub fn attach(&mut self, key: &str, model: &ModelRef, events: Vec<String>, handler: &Listener) {
        self.detach(key);

        let tokens = events
            .iter()
            .map(|event| {
                trace!("Attaching '{}' listener on '{}'", event, key);
                model.on(event, handler.clone())
            })
            .collect();

        self.active.insert(
            key.to_string(),
            Subscription {
                model: model.clone(),
                events,
                tokens,
            },
        );
    }

    /// Drop every listener held under `key`. Returns whether there was a
    /// subscription.
    pub fn detach(&mut self, key: &str) -> bool {
        let Some(subscription) = self.active.remove(key) else {
            return false;
        };
        for token in subscription.tokens {
            if !subscription.model.off(token) {
                warn!("Listener {:?} on '{}' was already gone", token, key);
            }
        }
        trace!("Detached '{}'", key);
        true
    }

    /// Bring the subscriptions in line with `mapping`.
    ///
    /// Walks the union of previous and new keys:
    /// - key now absent (or gone) but subscribed → detach;
    /// - same model as before → nothing;
    /// - different model (or newly present) → detach the old one, attach the new.
    pub fn sync(
        &mut self,
        mapping: &ModelMapping,
        config: &HashMap<String, EventSelection>,
        handler: &Listener,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        let keys: BTreeSet<String> = self
            .active
            .keys()
            .cloned()
            .chain(mapping.keys().map(str::to_string))
            .collect();

        for key in keys {
            let previous = self.active.get(&key).map(|subscription| subscription.model.clone());
            match (previous, mapping.get(&key)) {
                (Some(_), None) => {
                    self.detach(&key);
                    report.detached.push(key);
                }
                (Some(previous), Some(next)) if same_model(&previous, next) => {}
                (previous, Some(next)) => {
                    if previous.is_some() {
                        self.detach(&key);
                        report.detached.push(key.clone());
                    }
                    self.attach(&key, next, resolve_event_names(&key, config), handler);
                    report.attached.push(key);
                }
                (None, None) => {}
            }
        }

        if !report.is_empty() {
            debug!(
                "Subscriptions synced: attached {:?}, detached {:?}",
                report.attached, report.detached
            );
        }
        report
    }

    /// Detach everything. Returns the number of subscriptions dropped.
    pub fn detach_all(&mut self) -> usize {
        let keys: Vec<String> = self.active.keys().cloned().collect();
        for key in &keys {
            self.detach(key);
        }
        keys.len()
    }

    pub fn get(&self, key: &str) -> Option<&Subscription> {
        self.active.get(key)
    }

    /// Subscribed keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.active.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Whether `model` is the model subscribed under `key`.
    pub fn is_subscribed_to(&self, key: &str, model: &ModelRef) -> bool {
        self.active
            .get(key)
            .is_some_and(|subscription| same_model(&subscription.model, model))
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
