//! Combines context and direct models into the effective mapping.

use tracing::trace;

use crate::error::BindError;
use crate::mapping::ModelMapping;
use crate::registry::ModelTypes;

/// Compute the effective mapping for one render.
///
/// Directly supplied entries replace context entries under the same key,
/// including direct entries that hold no model. Requirements are checked on
/// the merged result before the caller touches any subscription.
///
/// # Errors
///
/// Returns `BindError::ModelTypeMismatch` if a present model fails its
/// requirement.
pub fn resolve_models(
    context: Option<&ModelMapping>,
    direct: Option<&ModelMapping>,
    requirements: &ModelTypes,
) -> Result<ModelMapping, BindError> {
    let resolved = match (context, direct) {
        (Some(context), Some(direct)) => context.overlay(direct),
        (Some(only), None) | (None, Some(only)) => only.clone(),
        (None, None) => ModelMapping::new(),
    };

    requirements.validate(&resolved)?;
    trace!("Resolved {} model key(s)", resolved.len());
    Ok(resolved)
}
