//! Named-event emitter used by every model type.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::lock;

/// The catch-all event name. Listeners registered under it receive every
/// event after the listeners registered for the specific name.
pub const ALL_EVENTS: &str = "all";

/// An event emitted by a model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelEvent {
    /// The event name, e.g. `change:name` or `add`.
    pub name: String,
    /// Event-specific data (the new attribute value, the added model's snapshot, ...).
    pub payload: JsonValue,
}

impl ModelEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: JsonValue::Null,
        }
    }

    pub fn with_payload(name: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// A listener callback. The same `Arc` may be registered under several event
/// names; each registration gets its own token.
pub type Listener = Arc<dyn Fn(&ModelEvent) + Send + Sync>;

/// Opaque handle returned by [`Events::on`] and consumed by [`Events::off`].
///
/// Tokens are unique across all emitters in the process, so a token can never
/// remove a listener from an emitter it was not issued by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerToken(u64);

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

impl ListenerToken {
    fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

struct Registration {
    token: ListenerToken,
    event: String,
    listener: Listener,
}

/// Ordered listener table.
///
/// Delivery is synchronous and follows subscription order. The listener list
/// is snapshotted before dispatch, so a listener removed while an event is
/// being delivered still receives that event.
#[derive(Default)]
pub struct Events {
    registrations: Mutex<Vec<Registration>>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `event` and return the token that removes it.
    pub fn on(&self, event: &str, listener: Listener) -> ListenerToken {
        let token = ListenerToken::next();
        lock(&self.registrations).push(Registration {
            token,
            event: event.to_string(),
            listener,
        });
        trace!("Registered listener {:?} for '{}'", token, event);
        token
    }

    /// Remove the registration identified by `token`.
    ///
    /// Returns false if the token was already removed or never issued here.
    pub fn off(&self, token: ListenerToken) -> bool {
        let mut registrations = lock(&self.registrations);
        let before = registrations.len();
        registrations.retain(|registration| registration.token != token);
        before != registrations.len()
    }

    /// Deliver `event` to its specific listeners, then to catch-all listeners.
    pub fn trigger(&self, event: &ModelEvent) {
        let targets: Vec<Listener> = {
            let registrations = lock(&self.registrations);
            let specific = registrations
                .iter()
                .filter(|registration| registration.event == event.name);
            let catch_all = registrations.iter().filter(|registration| {
                event.name != ALL_EVENTS && registration.event == ALL_EVENTS
            });
            specific
                .chain(catch_all)
                .map(|registration| registration.listener.clone())
                .collect()
        };

        trace!("Triggering '{}' for {} listener(s)", event.name, targets.len());
        for listener in targets {
            listener(event);
        }
    }

    /// Number of listeners registered under exactly `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        lock(&self.registrations)
            .iter()
            .filter(|registration| registration.event == event)
            .count()
    }

    pub fn total_listeners(&self) -> usize {
        lock(&self.registrations).len()
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Events")
            .field("listeners", &self.total_listeners())
            .finish()
    }
}
