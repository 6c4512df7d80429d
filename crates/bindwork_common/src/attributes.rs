//! A JSON attribute model that announces its changes.

use std::any::Any;
use std::fmt;
use std::sync::Mutex;

use serde_json::{Map, Value as JsonValue};
use tracing::trace;

use crate::events::{Events, Listener, ListenerToken, ModelEvent};
use crate::lock;
use crate::model::Model;

/// A model holding a flat set of JSON attributes.
///
/// Every attribute whose value actually changes emits `change:<attr>` with
/// the new value as payload, and a single `change` event follows once all
/// attribute events of the same call are delivered. Setting an attribute to
/// its current value emits nothing.
///
/// # Example
///
/// ```rust
/// use bindwork_common::{AttributeModel, Model};
/// use serde_json::json;
///
/// let user = AttributeModel::from_json(json!({ "name": "Harry", "age": 25 }))
///     .with_kind("UserModel");
///
/// user.set("name", json!("Robert"));
/// assert_eq!(user.get("name"), Some(json!("Robert")));
/// assert!(user.is_a("Model"));
/// ```
pub struct AttributeModel {
    kind: String,
    attributes: Mutex<Map<String, JsonValue>>,
    events: Events,
}

impl AttributeModel {
    /// Kind reported by every attribute model.
    pub const KIND: &'static str = "Model";

    /// Create an empty model.
    pub fn new() -> Self {
        Self::from_map(Map::new())
    }

    /// Create a model from a JSON object. Non-object values yield an empty model.
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => Self::from_map(map),
            _ => Self::new(),
        }
    }

    pub fn from_map(attributes: Map<String, JsonValue>) -> Self {
        Self {
            kind: Self::KIND.to_string(),
            attributes: Mutex::new(attributes),
            events: Events::new(),
        }
    }

    /// Report a more specific kind on top of [`AttributeModel::KIND`].
    pub fn with_kind(self, kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..self
        }
    }

    pub fn get(&self, key: &str) -> Option<JsonValue> {
        lock(&self.attributes).get(key).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        lock(&self.attributes).contains_key(key)
    }

    /// Copy of all attributes.
    pub fn attributes(&self) -> Map<String, JsonValue> {
        lock(&self.attributes).clone()
    }

    /// Set one attribute. Returns whether the value changed.
    pub fn set(&self, key: &str, value: JsonValue) -> bool {
        let mut changes = Map::new();
        changes.insert(key.to_string(), value);
        !self.set_many(changes).is_empty()
    }

    /// Set several attributes at once and return the keys that changed.
    pub fn set_many(&self, changes: Map<String, JsonValue>) -> Vec<String> {
        let mut changed = Vec::new();
        {
            let mut attributes = lock(&self.attributes);
            for (key, value) in changes {
                if attributes.get(&key) != Some(&value) {
                    attributes.insert(key.clone(), value.clone());
                    changed.push((key, value));
                }
            }
        }
        self.announce(changed)
    }

    /// Remove an attribute. Returns whether it existed.
    pub fn unset(&self, key: &str) -> bool {
        let removed = lock(&self.attributes).remove(key).is_some();
        if removed {
            self.announce(vec![(key.to_string(), JsonValue::Null)]);
        }
        removed
    }

    /// Remove every attribute.
    pub fn clear(&self) -> Vec<String> {
        let removed: Vec<(String, JsonValue)> = {
            let mut attributes = lock(&self.attributes);
            std::mem::take(&mut *attributes)
                .into_iter()
                .map(|(key, _)| (key, JsonValue::Null))
                .collect()
        };
        self.announce(removed)
    }

    /// Emit `change:<attr>` per changed attribute, then `change`.
    fn announce(&self, changed: Vec<(String, JsonValue)>) -> Vec<String> {
        if changed.is_empty() {
            return Vec::new();
        }

        trace!("{} attribute(s) changed on {}", changed.len(), self.kind);
        let keys: Vec<String> = changed.iter().map(|(key, _)| key.clone()).collect();
        for (key, value) in changed {
            self.events
                .trigger(&ModelEvent::with_payload(format!("change:{}", key), value));
        }
        self.events.trigger(&ModelEvent::with_payload(
            "change",
            JsonValue::Array(keys.iter().cloned().map(JsonValue::String).collect()),
        ));
        keys
    }

    /// Number of listeners currently registered on this model.
    pub fn listener_count(&self) -> usize {
        self.events.total_listeners()
    }
}

impl Default for AttributeModel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AttributeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeModel")
            .field("kind", &self.kind)
            .field("attributes", &*lock(&self.attributes))
            .finish()
    }
}

impl Model for AttributeModel {
    fn on(&self, event: &str, listener: Listener) -> ListenerToken {
        self.events.on(event, listener)
    }

    fn off(&self, token: ListenerToken) -> bool {
        self.events.off(token)
    }

    fn snapshot(&self) -> JsonValue {
        JsonValue::Object(self.attributes())
    }

    fn kinds(&self) -> Vec<String> {
        if self.kind == Self::KIND {
            vec![Self::KIND.to_string()]
        } else {
            vec![self.kind.clone(), Self::KIND.to_string()]
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ALL_EVENTS;
    use serde_json::json;
    use std::sync::Arc;

    fn record_all(model: &AttributeModel) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        model.on(
            ALL_EVENTS,
            Arc::new(move |event: &ModelEvent| sink.lock().unwrap().push(event.name.clone())),
        );
        log
    }

    #[test]
    fn set_emits_attribute_event_then_change() {
        let user = AttributeModel::from_json(json!({ "name": "Harry", "age": 25 }));
        let log = record_all(&user);

        assert!(user.set("name", json!("Robert")));
        assert_eq!(*log.lock().unwrap(), vec!["change:name", "change"]);
        assert_eq!(user.snapshot(), json!({ "name": "Robert", "age": 25 }));
    }

    #[test]
    fn unchanged_value_is_silent() {
        let user = AttributeModel::from_json(json!({ "age": 25 }));
        let log = record_all(&user);

        assert!(!user.set("age", json!(25)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn set_many_reports_only_changed_keys() {
        let user = AttributeModel::from_json(json!({ "name": "Harry", "age": 25 }));
        let log = record_all(&user);

        let mut changes = Map::new();
        changes.insert("name".into(), json!("Harry"));
        changes.insert("hungry".into(), json!(true));
        assert_eq!(user.set_many(changes), vec!["hungry".to_string()]);
        assert_eq!(*log.lock().unwrap(), vec!["change:hungry", "change"]);
    }

    #[test]
    fn unset_and_clear() {
        let user = AttributeModel::from_json(json!({ "name": "Harry", "age": 25 }));
        assert!(user.unset("age"));
        assert!(!user.unset("age"));
        assert!(!user.has("age"));

        assert_eq!(user.clear(), vec!["name".to_string()]);
        assert_eq!(user.snapshot(), json!({}));
    }

    #[test]
    fn non_object_json_builds_empty_model() {
        let model = AttributeModel::from_json(json!([1, 2, 3]));
        assert_eq!(model.snapshot(), json!({}));
        assert_eq!(model.kinds(), vec!["Model".to_string()]);
    }
}
