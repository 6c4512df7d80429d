//! Component and projection traits.

use serde_json::Value as JsonValue;

use crate::mapping::ModelMapping;
use crate::props::Props;

/// A renderable target wrapped by the binder.
///
/// `render` receives the merged props (derived props overlaid with the
/// instance's own props) every time the instance re-renders. The latest
/// output is kept on the connected instance.
///
/// # Example
///
/// ```rust
/// use bindwork_client::{Component, Props};
///
/// struct Badge;
///
/// impl Component for Badge {
///     type Output = String;
///
///     fn render(&mut self, props: &Props) -> String {
///         format!("[{}]", props.to_json())
///     }
/// }
/// ```
pub trait Component: Send + 'static {
    type Output: Clone + Send + 'static;

    fn render(&mut self, props: &Props) -> Self::Output;
}

/// Projection from the active models (and the instance's own props) to
/// derived props.
///
/// Called on mount, on every update and on every triggering event. It must
/// not subscribe to anything; reading model snapshots is what it is for.
/// Implemented for any `Fn(&ModelMapping, &Props) -> Props`.
pub trait MapModelsToProps: Send + Sync + 'static {
    fn map(&self, models: &ModelMapping, own: &Props) -> Props;
}

impl<F> MapModelsToProps for F
where
    F: Fn(&ModelMapping, &Props) -> Props + Send + Sync + 'static,
{
    fn map(&self, models: &ModelMapping, own: &Props) -> Props {
        self(models, own)
    }
}

/// Default projection: one prop per key holding the model's snapshot, or
/// `null` for a key without a model.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnapshotProjection;

impl MapModelsToProps for SnapshotProjection {
    fn map(&self, models: &ModelMapping, _own: &Props) -> Props {
        let mut props = Props::new();
        for (key, model) in models.iter() {
            let value = model.map_or(JsonValue::Null, |model| model.snapshot());
            props.insert_value(key, value);
        }
        props
    }
}
