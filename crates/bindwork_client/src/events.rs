//! Which event names to subscribe to for each model key.

use std::collections::HashMap;

use crate::config::EventSelection;

/// Event observed when no explicit selection is configured for a key.
pub const CATCH_ALL_EVENT: &str = bindwork_common::ALL_EVENTS;

/// Event names to subscribe for the model under `key`.
///
/// - [`EventSelection::Disabled`] → nothing.
/// - [`EventSelection::Names`] with at least one name → the list verbatim,
///   order preserved.
/// - anything else (an empty list, [`EventSelection::CatchAll`], no entry)
///   → [`CATCH_ALL_EVENT`].
pub fn resolve_event_names(key: &str, config: &HashMap<String, EventSelection>) -> Vec<String> {
    match config.get(key) {
        Some(EventSelection::Disabled) => Vec::new(),
        Some(EventSelection::Names(names)) if !names.is_empty() => names.clone(),
        _ => vec![CATCH_ALL_EVENT.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HashMap<String, EventSelection> {
        let mut config = HashMap::new();
        config.insert("user".to_string(), EventSelection::names(["change:name", "change:age"]));
        config.insert("coll".to_string(), EventSelection::Disabled);
        config.insert("loose".to_string(), EventSelection::CatchAll);
        config.insert("empty".to_string(), EventSelection::Names(Vec::new()));
        config
    }

    #[test]
    fn explicit_lists_are_verbatim() {
        assert_eq!(
            resolve_event_names("user", &config()),
            vec!["change:name".to_string(), "change:age".to_string()]
        );
    }

    #[test]
    fn disabled_observes_nothing() {
        assert!(resolve_event_names("coll", &config()).is_empty());
    }

    #[test]
    fn empty_missing_or_catch_all_use_all() {
        assert_eq!(resolve_event_names("empty", &config()), vec!["all".to_string()]);
        assert_eq!(resolve_event_names("loose", &config()), vec!["all".to_string()]);
        assert_eq!(resolve_event_names("unknown", &config()), vec!["all".to_string()]);
    }
}
