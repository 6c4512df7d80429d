//! Props handed to target components.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

/// Name of the input that carries models into a connected component. It is
/// never forwarded to the wrapped target.
pub const MODELS_PROP: &str = "models";

/// A callable prop, e.g. an action that mutates a model.
pub type Callback = Arc<dyn Fn(JsonValue) + Send + Sync>;

/// A single prop value.
#[derive(Clone)]
pub enum Prop {
    Value(JsonValue),
    Callback(Callback),
}

impl Prop {
    pub fn as_value(&self) -> Option<&JsonValue> {
        match self {
            Prop::Value(value) => Some(value),
            Prop::Callback(_) => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Prop::Value(_) => None,
            Prop::Callback(callback) => Some(callback),
        }
    }
}

impl fmt::Debug for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::Value(value) => write!(f, "{}", value),
            Prop::Callback(_) => f.write_str("<callback>"),
        }
    }
}

impl From<JsonValue> for Prop {
    fn from(value: JsonValue) -> Self {
        Prop::Value(value)
    }
}

/// Props handed to a component: plain JSON values plus callbacks.
#[derive(Clone, Default, Debug)]
pub struct Props {
    entries: BTreeMap<String, Prop>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Props from a JSON object; other JSON values yield empty props.
    pub fn from_json(value: JsonValue) -> Self {
        let mut props = Self::new();
        if let JsonValue::Object(map) = value {
            for (key, value) in map {
                props.insert_value(key, value);
            }
        }
        props
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.insert_value(key, value);
        self
    }

    pub fn with_callback<F>(mut self, key: impl Into<String>, callback: F) -> Self
    where
        F: Fn(JsonValue) + Send + Sync + 'static,
    {
        self.insert_callback(key, callback);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, prop: Prop) -> Option<Prop> {
        self.entries.insert(key.into(), prop)
    }

    pub fn insert_value(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Option<Prop> {
        self.insert(key, Prop::Value(value.into()))
    }

    pub fn insert_callback<F>(&mut self, key: impl Into<String>, callback: F) -> Option<Prop>
    where
        F: Fn(JsonValue) + Send + Sync + 'static,
    {
        self.insert(key, Prop::Callback(Arc::new(callback)))
    }

    pub fn remove(&mut self, key: &str) -> Option<Prop> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Prop> {
        self.entries.get(key)
    }

    /// The JSON value under `key`; `None` for missing keys and callbacks.
    pub fn value(&self, key: &str) -> Option<&JsonValue> {
        self.get(key).and_then(Prop::as_value)
    }

    /// Invoke the callback under `key`. Returns false if there is none.
    pub fn call(&self, key: &str, argument: JsonValue) -> bool {
        match self.get(key).and_then(Prop::as_callback) {
            Some(callback) => {
                callback(argument);
                true
            }
            None => false,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay `own` on top of these (derived) props: `own` wins on
    /// collisions, and [`MODELS_PROP`] is dropped from the result.
    pub fn merged_with(mut self, own: &Props) -> Props {
        for (key, prop) in &own.entries {
            self.entries.insert(key.clone(), prop.clone());
        }
        self.entries.remove(MODELS_PROP);
        self
    }

    /// JSON object of every value prop. Callbacks are skipped.
    pub fn to_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .entries
            .iter()
            .filter_map(|(key, prop)| prop.as_value().map(|value| (key.clone(), value.clone())))
            .collect();
        JsonValue::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn own_props_win_and_models_is_stripped() {
        let derived = Props::new()
            .with_value("name", "Harry")
            .with_value("age", 25);
        let own = Props::new()
            .with_value("age", 30)
            .with_value(MODELS_PROP, json!({ "user": null }))
            .with_value("title", "Dr");

        let merged = derived.merged_with(&own);
        assert_eq!(merged.to_json(), json!({ "name": "Harry", "age": 30, "title": "Dr" }));
        assert!(!merged.contains_key(MODELS_PROP));
    }

    #[test]
    fn callbacks_are_callable_and_skipped_in_json() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let props = Props::new()
            .with_value("name", "Harry")
            .with_callback("changeName", move |value| *sink.lock().unwrap() = Some(value));

        assert!(props.call("changeName", json!("Robert")));
        assert!(!props.call("name", json!("ignored")));
        assert!(!props.call("missing", JsonValue::Null));
        assert_eq!(*seen.lock().unwrap(), Some(json!("Robert")));
        assert_eq!(props.to_json(), json!({ "name": "Harry" }));
        assert!(props.value("changeName").is_none());
    }

    #[test]
    fn from_json_reads_objects_only() {
        assert_eq!(Props::from_json(json!({ "a": 1 })).len(), 1);
        assert!(Props::from_json(json!("scalar")).is_empty());
    }
}
