//! Keyed sets of models.

use std::collections::HashMap;
use std::fmt;

use bindwork_common::{Model, ModelRef, downcast_model, same_model};

/// Named models visible to a component instance.
///
/// A key may be present with no model (`None`). An absent entry is a gap,
/// not a model: it is never subscribed to, but it still overrides a model
/// supplied under the same key by an outer mapping (see [`ModelMapping::overlay`]).
#[derive(Clone, Default)]
pub struct ModelMapping {
    entries: HashMap<String, Option<ModelRef>>,
}

impl ModelMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ModelMapping::insert`].
    pub fn with(mut self, key: impl Into<String>, model: ModelRef) -> Self {
        self.insert(key, model);
        self
    }

    /// Builder form of [`ModelMapping::insert_absent`].
    pub fn with_absent(mut self, key: impl Into<String>) -> Self {
        self.insert_absent(key);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, model: ModelRef) -> Option<Option<ModelRef>> {
        self.entries.insert(key.into(), Some(model))
    }

    /// Record `key` with no model.
    pub fn insert_absent(&mut self, key: impl Into<String>) -> Option<Option<ModelRef>> {
        self.entries.insert(key.into(), None)
    }

    pub fn remove(&mut self, key: &str) -> Option<Option<ModelRef>> {
        self.entries.remove(key)
    }

    /// The model under `key`, if the key exists and holds a model.
    pub fn get(&self, key: &str) -> Option<&ModelRef> {
        self.entries.get(key).and_then(Option::as_ref)
    }

    /// The model under `key` downcast to its concrete type.
    pub fn get_as<T: Model>(&self, key: &str) -> Option<&T> {
        self.get(key).and_then(downcast_model::<T>)
    }

    /// Whether `key` exists, with or without a model.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether `key` holds exactly `model`.
    pub fn holds(&self, key: &str, model: &ModelRef) -> bool {
        self.get(key).is_some_and(|current| same_model(current, model))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Keys in sorted order.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ModelRef>)> {
        self.entries
            .iter()
            .map(|(key, model)| (key.as_str(), model.as_ref()))
    }

    /// Entries that hold a model.
    pub fn present(&self) -> impl Iterator<Item = (&str, &ModelRef)> {
        self.entries
            .iter()
            .filter_map(|(key, model)| model.as_ref().map(|model| (key.as_str(), model)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A new mapping with every entry of `top` replacing the entry of `self`
    /// under the same key, including entries of `top` that hold no model.
    pub fn overlay(&self, top: &ModelMapping) -> ModelMapping {
        let mut merged = self.clone();
        for (key, model) in &top.entries {
            merged.entries.insert(key.clone(), model.clone());
        }
        merged
    }
}

impl fmt::Debug for ModelMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for key in self.sorted_keys() {
            let description = match self.get(key) {
                Some(model) => model.kinds().first().cloned().unwrap_or_default(),
                None => "<absent>".to_string(),
            };
            map.entry(&key, &description);
        }
        map.finish()
    }
}

impl FromIterator<(String, ModelRef)> for ModelMapping {
    fn from_iter<I: IntoIterator<Item = (String, ModelRef)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, model)| (key, Some(model)))
                .collect(),
        }
    }
}
