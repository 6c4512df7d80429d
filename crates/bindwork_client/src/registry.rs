//! Per-key model type requirements.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bindwork_common::Model;

use crate::error::BindError;
use crate::mapping::ModelMapping;

/// What a model under a given key must be.
#[derive(Clone)]
pub enum ModelRequirement {
    /// The model's kind lineage must contain this kind name, so a more
    /// specific model satisfies a requirement for its general kind.
    Kind(String),
    /// An arbitrary capability check.
    Predicate {
        description: String,
        check: Arc<dyn Fn(&dyn Model) -> bool + Send + Sync>,
    },
}

impl ModelRequirement {
    pub fn kind(kind: impl Into<String>) -> Self {
        ModelRequirement::Kind(kind.into())
    }

    pub fn predicate<F>(description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&dyn Model) -> bool + Send + Sync + 'static,
    {
        ModelRequirement::Predicate {
            description: description.into(),
            check: Arc::new(check),
        }
    }

    pub fn accepts(&self, model: &dyn Model) -> bool {
        match self {
            ModelRequirement::Kind(kind) => model.is_a(kind),
            ModelRequirement::Predicate { check, .. } => check(model),
        }
    }

    /// Human readable name of the requirement, used in error messages.
    pub fn describe(&self) -> &str {
        match self {
            ModelRequirement::Kind(kind) => kind,
            ModelRequirement::Predicate { description, .. } => description,
        }
    }
}

impl fmt::Debug for ModelRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelRequirement::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            ModelRequirement::Predicate { description, .. } => {
                f.debug_tuple("Predicate").field(description).finish()
            }
        }
    }
}

/// Required model types per key.
///
/// # Example
///
/// ```rust
/// use bindwork_client::{ModelRequirement, ModelTypes};
///
/// let types = ModelTypes::builder()
///     .require("user", ModelRequirement::kind("UserModel"))
///     .require("coll", ModelRequirement::kind("Collection"))
///     .build();
///
/// assert!(types.get("user").is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ModelTypes {
    requirements: HashMap<String, ModelRequirement>,
}

impl ModelTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ModelTypesBuilder {
        ModelTypesBuilder::new()
    }

    pub fn insert(&mut self, key: impl Into<String>, requirement: ModelRequirement) {
        self.requirements.insert(key.into(), requirement);
    }

    pub fn get(&self, key: &str) -> Option<&ModelRequirement> {
        self.requirements.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Check every model of `mapping` that has a requirement.
    ///
    /// Keys are checked in sorted order so the reported key is deterministic.
    /// Keys without a model are never checked.
    ///
    /// # Errors
    ///
    /// Returns `BindError::ModelTypeMismatch` naming the first offending key.
    pub fn validate(&self, mapping: &ModelMapping) -> Result<(), BindError> {
        if self.requirements.is_empty() {
            return Ok(());
        }

        for key in mapping.sorted_keys() {
            let (Some(requirement), Some(model)) = (self.requirements.get(key), mapping.get(key))
            else {
                continue;
            };
            if !requirement.accepts(&**model) {
                return Err(BindError::ModelTypeMismatch {
                    key: key.to_string(),
                    expected: requirement.describe().to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Builder for constructing [`ModelTypes`].
pub struct ModelTypesBuilder {
    types: ModelTypes,
}

impl ModelTypesBuilder {
    pub fn new() -> Self {
        Self {
            types: ModelTypes::new(),
        }
    }

    /// Require `requirement` for the model under `key`.
    pub fn require(mut self, key: impl Into<String>, requirement: ModelRequirement) -> Self {
        self.types.insert(key, requirement);
        self
    }

    pub fn build(self) -> ModelTypes {
        self.types
    }
}

impl Default for ModelTypesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindwork_common::{AttributeModel, Collection};
    use std::sync::Arc;

    fn user() -> Arc<AttributeModel> {
        Arc::new(AttributeModel::new().with_kind("UserModel"))
    }

    #[test]
    fn kind_requirement_accepts_general_case_of_specific_model() {
        let mapping = ModelMapping::new().with("user", user());

        let exact = ModelTypes::builder()
            .require("user", ModelRequirement::kind("UserModel"))
            .build();
        let general = ModelTypes::builder()
            .require("user", ModelRequirement::kind("Model"))
            .build();

        assert_eq!(exact.validate(&mapping), Ok(()));
        assert_eq!(general.validate(&mapping), Ok(()));
    }

    #[test]
    fn mismatch_names_the_key() {
        let mapping = ModelMapping::new()
            .with("user", Arc::new(Collection::new()))
            .with("zeta", Arc::new(Collection::new()));
        let types = ModelTypes::builder()
            .require("user", ModelRequirement::kind("UserModel"))
            .require("zeta", ModelRequirement::kind("UserModel"))
            .build();

        let err = types.validate(&mapping).unwrap_err();
        assert_eq!(
            err,
            BindError::ModelTypeMismatch {
                key: "user".into(),
                expected: "UserModel".into(),
            }
        );
        assert!(err.to_string().contains("\"user\""));
    }

    #[test]
    fn absent_models_and_unconstrained_keys_pass() {
        let mapping = ModelMapping::new()
            .with_absent("user")
            .with("free", Arc::new(Collection::new()));
        let types = ModelTypes::builder()
            .require("user", ModelRequirement::kind("UserModel"))
            .build();
        assert!(types.validate(&mapping).is_ok());
    }

    #[test]
    fn predicate_requirement() {
        let has_name = ModelRequirement::predicate("model with a name", |model| {
            model.snapshot().get("name").is_some()
        });
        let named = AttributeModel::from_json(serde_json::json!({ "name": "x" }));
        let anonymous = AttributeModel::new();

        assert!(has_name.accepts(&named));
        assert!(!has_name.accepts(&anonymous));
        assert_eq!(has_name.describe(), "model with a name");
    }
}
