//! Ordered collections of models.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::events::{ALL_EVENTS, Events, Listener, ListenerToken, ModelEvent};
use crate::lock;
use crate::model::{Model, ModelRef, same_model};

struct Member {
    model: ModelRef,
    // Registration on the member that re-emits its events on the collection.
    forward: ListenerToken,
}

/// An ordered list of models.
///
/// Emits `add` / `remove` (payload: the member snapshot) followed by
/// `update`, and `reset` when the contents are replaced wholesale. Every event
/// emitted by a member is re-emitted on the collection while the model is a
/// member, so a listener on the collection's catch-all event sees member
/// `change` events too.
pub struct Collection {
    members: Mutex<Vec<Member>>,
    events: Arc<Events>,
}

impl Collection {
    pub const KIND: &'static str = "Collection";

    pub fn new() -> Self {
        Self {
            members: Mutex::new(Vec::new()),
            events: Arc::new(Events::new()),
        }
    }

    /// Build a collection from existing models without emitting events.
    pub fn from_models(models: impl IntoIterator<Item = ModelRef>) -> Self {
        let collection = Self::new();
        {
            let mut members = lock(&collection.members);
            for model in models {
                let forward = collection.forward_from(&model);
                members.push(Member { model, forward });
            }
        }
        collection
    }

    /// Append `model`. Returns false (and emits nothing) if it is already a member.
    pub fn add(&self, model: ModelRef) -> bool {
        {
            let mut members = lock(&self.members);
            if members.iter().any(|member| same_model(&member.model, &model)) {
                return false;
            }
            let forward = self.forward_from(&model);
            members.push(Member {
                model: model.clone(),
                forward,
            });
        }

        self.events
            .trigger(&ModelEvent::with_payload("add", model.snapshot()));
        self.events.trigger(&ModelEvent::new("update"));
        true
    }

    /// Remove `model`. Returns false if it was not a member.
    pub fn remove(&self, model: &ModelRef) -> bool {
        let removed = {
            let mut members = lock(&self.members);
            let position = members
                .iter()
                .position(|member| same_model(&member.model, model));
            position.map(|index| members.remove(index))
        };

        let Some(member) = removed else {
            return false;
        };
        Self::stop_forwarding(&member);

        self.events
            .trigger(&ModelEvent::with_payload("remove", member.model.snapshot()));
        self.events.trigger(&ModelEvent::new("update"));
        true
    }

    /// Replace the contents and emit a single `reset`.
    pub fn reset(&self, models: impl IntoIterator<Item = ModelRef>) {
        let previous = {
            let mut members = lock(&self.members);
            let fresh: Vec<Member> = models
                .into_iter()
                .map(|model| {
                    let forward = self.forward_from(&model);
                    Member { model, forward }
                })
                .collect();
            std::mem::replace(&mut *members, fresh)
        };
        for member in &previous {
            Self::stop_forwarding(member);
        }

        debug!("Collection reset ({} previous member(s))", previous.len());
        self.events.trigger(&ModelEvent::with_payload("reset", self.snapshot()));
    }

    pub fn get(&self, index: usize) -> Option<ModelRef> {
        lock(&self.members)
            .get(index)
            .map(|member| member.model.clone())
    }

    pub fn models(&self) -> Vec<ModelRef> {
        lock(&self.members)
            .iter()
            .map(|member| member.model.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.members).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.members).is_empty()
    }

    /// Number of listeners registered on the collection itself.
    pub fn listener_count(&self) -> usize {
        self.events.total_listeners()
    }

    fn forward_from(&self, model: &ModelRef) -> ListenerToken {
        let events: Weak<Events> = Arc::downgrade(&self.events);
        let forward: Listener = Arc::new(move |event: &ModelEvent| {
            if let Some(events) = events.upgrade() {
                events.trigger(event);
            }
        });
        model.on(ALL_EVENTS, forward)
    }

    fn stop_forwarding(member: &Member) {
        if !member.model.off(member.forward) {
            warn!("Collection member lost its forwarding listener before removal");
        }
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Collection {
    fn drop(&mut self) {
        let members = std::mem::take(&mut *lock(&self.members));
        for member in &members {
            Self::stop_forwarding(member);
        }
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("len", &self.len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Model for Collection {
    fn on(&self, event: &str, listener: Listener) -> ListenerToken {
        self.events.on(event, listener)
    }

    fn off(&self, token: ListenerToken) -> bool {
        self.events.off(token)
    }

    fn snapshot(&self) -> JsonValue {
        JsonValue::Array(
            self.models()
                .iter()
                .map(|model| model.snapshot())
                .collect(),
        )
    }

    fn kinds(&self) -> Vec<String> {
        vec![Self::KIND.to_string()]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
