//! Hooks for reading the nearest provider's models.

use bindwork_common::ModelRef;
use serde_json::{Map, Value as JsonValue};

use crate::context::{ContextScope, ModelContext};
use crate::error::BindError;
use crate::mapping::ModelMapping;

/// Hook to access the nearest [`ModelContext`].
///
/// # Errors
///
/// Returns `BindError::MissingProvider` if no `ModelProvider` is in scope.
pub fn use_model_context(scope: &ContextScope) -> Result<&ModelContext, BindError> {
    scope.get::<ModelContext>().ok_or(BindError::MissingProvider)
}

/// Hook to read the models published by the nearest provider.
///
/// # Errors
///
/// Returns `BindError::MissingProvider` if no `ModelProvider` is in scope.
pub fn use_models(scope: &ContextScope) -> Result<ModelMapping, BindError> {
    use_model_context(scope).map(|context| context.models().clone())
}

/// Hook to read one model from the nearest provider. `Ok(None)` means the
/// provider has no model under `key`.
pub fn use_model(scope: &ContextScope, key: &str) -> Result<Option<ModelRef>, BindError> {
    use_model_context(scope).map(|context| context.models().get(key).cloned())
}

/// Hook to read plain snapshots of the provider's models, keyed like the
/// mapping. Keys without a model map to `null`.
///
/// # Errors
///
/// Returns `BindError::MissingProvider` if no `ModelProvider` is in scope.
pub fn use_model_snapshots(scope: &ContextScope) -> Result<Map<String, JsonValue>, BindError> {
    let context = use_model_context(scope)?;
    Ok(context
        .models()
        .iter()
        .map(|(key, model)| {
            let snapshot = model.map_or(JsonValue::Null, |model| model.snapshot());
            (key.to_string(), snapshot)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ModelProvider;
    use bindwork_common::AttributeModel;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn hooks_fail_fast_without_provider() {
        let scope = ContextScope::new();
        assert_eq!(use_models(&scope).err(), Some(BindError::MissingProvider));
        assert!(matches!(use_model(&scope, "user"), Err(BindError::MissingProvider)));
        assert_eq!(use_model_snapshots(&scope), Err(BindError::MissingProvider));
    }

    #[test]
    fn snapshots_follow_provider_models() {
        let user = Arc::new(AttributeModel::from_json(json!({ "name": "Harry" })));
        let provider = ModelProvider::new(
            ModelMapping::new()
                .with("user", user.clone())
                .with_absent("decorator"),
        );
        let mut scope = ContextScope::new();

        provider.render(&mut scope, |scope| {
            let snapshots = use_model_snapshots(scope).unwrap();
            assert_eq!(snapshots["user"], json!({ "name": "Harry" }));
            assert_eq!(snapshots["decorator"], JsonValue::Null);

            user.set("name", json!("Robert"));
            assert_eq!(use_model_snapshots(scope).unwrap()["user"], json!({ "name": "Robert" }));
        });
    }

    #[test]
    fn hooks_read_nearest_provider() {
        let outer = ModelProvider::new(ModelMapping::new().with("user", Arc::new(AttributeModel::new())));
        let inner = ModelProvider::new(ModelMapping::new());
        let mut scope = ContextScope::new();

        outer.render(&mut scope, |scope| {
            assert!(use_model(scope, "user").unwrap().is_some());
            inner.render(scope, |scope| {
                assert!(use_model(scope, "user").unwrap().is_none());
                assert!(use_models(scope).unwrap().is_empty());
            });
        });
    }
}
