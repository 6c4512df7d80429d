//! Binder options and their JSON form.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::debounce::Scheduler;
use crate::error::BindError;
use crate::registry::{ModelRequirement, ModelTypes};

/// `debounce: false | true | <milliseconds>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DebounceSetting {
    Flag(bool),
    Millis(u64),
}

impl DebounceSetting {
    /// The debounce window, or `None` when re-renders are immediate.
    /// `false` and `0` are both immediate. `true` means a zero-length window:
    /// the render is deferred to the next timer turn, which still collapses
    /// synchronous bursts.
    pub fn wait(self) -> Option<Duration> {
        match self {
            DebounceSetting::Flag(false) | DebounceSetting::Millis(0) => None,
            DebounceSetting::Flag(true) => Some(Duration::ZERO),
            DebounceSetting::Millis(millis) => Some(Duration::from_millis(millis)),
        }
    }
}

impl Default for DebounceSetting {
    fn default() -> Self {
        DebounceSetting::Flag(false)
    }
}

/// Which events of a model to observe.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "RawSelection")]
pub enum EventSelection {
    /// Never listen to this model.
    Disabled,
    /// Listen to exactly these events, in this order. An empty list
    /// listens to the catch-all event.
    Names(Vec<String>),
    /// Listen to the catch-all event.
    CatchAll,
}

impl EventSelection {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EventSelection::Names(names.into_iter().map(Into::into).collect())
    }
}

// Wire shape of an `events` entry: `false`, a list of names, or anything else.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSelection {
    Flag(bool),
    Names(Vec<String>),
    Other(JsonValue),
}

impl From<RawSelection> for EventSelection {
    fn from(raw: RawSelection) -> Self {
        match raw {
            RawSelection::Flag(false) => EventSelection::Disabled,
            RawSelection::Names(names) => EventSelection::Names(names),
            RawSelection::Flag(true) | RawSelection::Other(_) => EventSelection::CatchAll,
        }
    }
}

/// Options for [`connect_models`](crate::connect_models).
///
/// The serializable part can be read from JSON:
///
/// ```rust
/// use std::time::Duration;
/// use bindwork_client::{BindOptions, EventSelection};
///
/// let options = BindOptions::from_json_str(
///     r#"{ "debounce": 50, "events": { "user": ["change:name"], "coll": false }, "withRef": true }"#,
/// ).unwrap();
///
/// assert_eq!(options.debounce.wait(), Some(Duration::from_millis(50)));
/// assert_eq!(options.events.get("coll"), Some(&EventSelection::Disabled));
/// assert!(options.with_ref);
/// ```
///
/// Model type requirements and the timer scheduler are set in code.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BindOptions {
    /// Re-render debouncing (default: immediate).
    pub debounce: DebounceSetting,
    /// Per-key event selection; keys not listed use the catch-all event.
    pub events: HashMap<String, EventSelection>,
    /// Expose the wrapped target instance (default: false).
    pub with_ref: bool,
    /// Required model kinds per key (default: no validation).
    #[serde(skip)]
    pub model_types: ModelTypes,
    /// Timer facility for debounced renders. A [`ThreadScheduler`](crate::ThreadScheduler)
    /// is used when none is given.
    #[serde(skip)]
    pub scheduler: Option<Arc<dyn Scheduler>>,
}

impl BindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the serializable options from JSON.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Config` if the JSON does not match the options shape.
    pub fn from_json_str(json: &str) -> Result<Self, BindError> {
        serde_json::from_str(json).map_err(|e| BindError::Config(e.to_string()))
    }

    /// Parse the serializable options from an already decoded JSON value.
    pub fn from_json(value: JsonValue) -> Result<Self, BindError> {
        serde_json::from_value(value).map_err(|e| BindError::Config(e.to_string()))
    }

    pub fn debounce(mut self, setting: DebounceSetting) -> Self {
        self.debounce = setting;
        self
    }

    /// Debounce re-renders by `millis` milliseconds.
    pub fn debounce_ms(self, millis: u64) -> Self {
        self.debounce(DebounceSetting::Millis(millis))
    }

    /// Listen to `events` on the model under `key`.
    pub fn listen<I, S>(mut self, key: impl Into<String>, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events.insert(key.into(), EventSelection::names(events));
        self
    }

    /// Never listen to the model under `key`.
    pub fn ignore(mut self, key: impl Into<String>) -> Self {
        self.events.insert(key.into(), EventSelection::Disabled);
        self
    }

    pub fn enable_ref(mut self, enabled: bool) -> Self {
        self.with_ref = enabled;
        self
    }

    pub fn require(mut self, key: impl Into<String>, requirement: ModelRequirement) -> Self {
        self.model_types.insert(key, requirement);
        self
    }

    pub fn model_types(mut self, model_types: ModelTypes) -> Self {
        self.model_types = model_types;
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }
}

impl fmt::Debug for BindOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindOptions")
            .field("debounce", &self.debounce)
            .field("events", &self.events)
            .field("with_ref", &self.with_ref)
            .field("model_types", &self.model_types)
            .field("scheduler", &self.scheduler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let options = BindOptions::from_json_str("{}").unwrap();
        assert_eq!(options.debounce, DebounceSetting::Flag(false));
        assert_eq!(options.debounce.wait(), None);
        assert!(options.events.is_empty());
        assert!(!options.with_ref);
        assert!(options.model_types.is_empty());
    }

    #[test]
    fn debounce_true_is_zero_window() {
        let options = BindOptions::from_json(json!({ "debounce": true })).unwrap();
        assert_eq!(options.debounce.wait(), Some(Duration::ZERO));
    }

    #[test]
    fn debounce_zero_is_immediate() {
        let options = BindOptions::from_json(json!({ "debounce": 0 })).unwrap();
        assert_eq!(options.debounce, DebounceSetting::Millis(0));
        assert_eq!(options.debounce.wait(), None);
        assert_eq!(BindOptions::new().debounce_ms(0).debounce.wait(), None);
    }

    #[test]
    fn event_entries_decode_to_selections() {
        let options = BindOptions::from_json(json!({
            "events": {
                "user": ["change:name", "change:age"],
                "coll": false,
                "loose": true,
                "odd": 7,
            }
        }))
        .unwrap();

        assert_eq!(
            options.events["user"],
            EventSelection::names(["change:name", "change:age"])
        );
        assert_eq!(options.events["coll"], EventSelection::Disabled);
        assert_eq!(options.events["loose"], EventSelection::CatchAll);
        assert_eq!(options.events["odd"], EventSelection::CatchAll);
    }

    #[test]
    fn malformed_options_are_config_errors() {
        let err = BindOptions::from_json_str(r#"{ "withRef": "yes" }"#).unwrap_err();
        assert!(matches!(err, BindError::Config(_)));
    }

    #[test]
    fn builder_matches_json() {
        let built = BindOptions::new()
            .debounce_ms(20)
            .listen("user", ["change:name"])
            .ignore("coll")
            .enable_ref(true);
        let parsed = BindOptions::from_json(json!({
            "debounce": 20,
            "events": { "user": ["change:name"], "coll": false },
            "withRef": true,
        }))
        .unwrap();

        assert_eq!(built.debounce, parsed.debounce);
        assert_eq!(built.events, parsed.events);
        assert_eq!(built.with_ref, parsed.with_ref);
    }
}
