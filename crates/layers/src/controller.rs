use std::fmt;

use foundation::{CameraState, LngLat};
use formats::LayerOpacityTrigger;
use tracing::debug;

use crate::paint::LayerKind;

/// The parts of the map library a story drives.
pub trait MapSurface {
    /// Style type of `layer` as the map reports it, `None` if the current
    /// style has no such layer.
    fn layer_type(&self, layer: &str) -> Option<String>;

    fn set_paint_property(
        &mut self,
        layer: &str,
        property: &str,
        value: f64,
    ) -> Result<(), LayerError>;

    fn fly_to(&mut self, camera: &CameraState);

    fn set_marker(&mut self, at: LngLat);
}

/// Map-side failures. These point at authoring mistakes and are not meant to
/// be swallowed.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerError {
    UnknownLayer { layer: String },
    UnsupportedLayerType { layer: String, layer_type: String },
    Map(String),
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerError::UnknownLayer { layer } => {
                write!(f, "layer '{layer}' does not exist in the map style")
            }
            LayerError::UnsupportedLayerType { layer, layer_type } => write!(
                f,
                "layer '{layer}' has type '{layer_type}', which has no opacity property"
            ),
            LayerError::Map(msg) => write!(f, "map error: {msg}"),
        }
    }
}

impl std::error::Error for LayerError {}

/// Sets every opacity paint property of the trigger's layer.
pub fn apply_opacity(
    map: &mut dyn MapSurface,
    trigger: &LayerOpacityTrigger,
) -> Result<(), LayerError> {
    let Some(layer_type) = map.layer_type(&trigger.layer) else {
        return Err(LayerError::UnknownLayer {
            layer: trigger.layer.clone(),
        });
    };
    let kind: LayerKind = layer_type
        .parse()
        .map_err(|_| LayerError::UnsupportedLayerType {
            layer: trigger.layer.clone(),
            layer_type: layer_type.clone(),
        })?;

    for property in kind.opacity_properties() {
        map.set_paint_property(&trigger.layer, property, trigger.opacity)?;
    }
    debug!(layer = %trigger.layer, opacity = trigger.opacity, kind = %kind, "applied opacity");
    Ok(())
}

/// Applies `triggers` in order, stopping at the first failure.
pub fn apply_triggers(
    map: &mut dyn MapSurface,
    triggers: &[LayerOpacityTrigger],
) -> Result<(), LayerError> {
    triggers.iter().try_for_each(|t| apply_opacity(map, t))
}

#[cfg(test)]
mod tests {
    use super::{LayerError, apply_opacity, apply_triggers};
    use crate::recording::{MapCall, RecordingMap};
    use formats::LayerOpacityTrigger;
    use pretty_assertions::assert_eq;

    #[test]
    fn fill_layer_sets_fill_opacity() {
        let mut map = RecordingMap::with_layers([("water", "fill")]);
        apply_opacity(&mut map, &LayerOpacityTrigger::new("water", 0.0)).unwrap();
        assert_eq!(map.calls, vec![MapCall::paint("water", "fill-opacity", 0.0)]);
    }

    #[test]
    fn symbol_layer_sets_both_properties_in_order() {
        let mut map = RecordingMap::with_layers([("labels", "symbol")]);
        apply_opacity(&mut map, &LayerOpacityTrigger::new("labels", 0.4)).unwrap();
        assert_eq!(
            map.calls,
            vec![
                MapCall::paint("labels", "icon-opacity", 0.4),
                MapCall::paint("labels", "text-opacity", 0.4),
            ]
        );
    }

    #[test]
    fn unknown_layer_fails_fast() {
        let mut map = RecordingMap::with_layers([("water", "fill")]);
        let err = apply_opacity(&mut map, &LayerOpacityTrigger::new("roads", 1.0)).unwrap_err();
        assert_eq!(
            err,
            LayerError::UnknownLayer {
                layer: "roads".into()
            }
        );
        assert!(map.calls.is_empty());
    }

    #[test]
    fn unsupported_type_is_an_error() {
        let mut map = RecordingMap::with_layers([("heat", "heatmap")]);
        let err = apply_opacity(&mut map, &LayerOpacityTrigger::new("heat", 1.0)).unwrap_err();
        assert!(matches!(err, LayerError::UnsupportedLayerType { .. }));
    }

    #[test]
    fn triggers_apply_in_order_and_stop_on_error() {
        let mut map = RecordingMap::with_layers([("a", "line"), ("c", "raster")]);
        let triggers = vec![
            LayerOpacityTrigger::new("a", 1.0),
            LayerOpacityTrigger::new("b", 1.0),
            LayerOpacityTrigger::new("c", 1.0),
        ];
        assert!(apply_triggers(&mut map, &triggers).is_err());
        assert_eq!(map.calls, vec![MapCall::paint("a", "line-opacity", 1.0)]);
    }
}
