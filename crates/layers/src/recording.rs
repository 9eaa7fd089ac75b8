//! In-memory [`MapSurface`] that records every call. Used by tests and by the
//! CLI's dry-run walk through a story.

use std::collections::BTreeMap;

use foundation::{CameraState, LngLat};

use crate::controller::{LayerError, MapSurface};

#[derive(Debug, Clone, PartialEq)]
pub enum MapCall {
    FlyTo(CameraState),
    Marker(LngLat),
    Paint {
        layer: String,
        property: String,
        value: f64,
    },
}

impl MapCall {
    pub fn paint(layer: &str, property: &str, value: f64) -> Self {
        MapCall::Paint {
            layer: layer.to_string(),
            property: property.to_string(),
            value,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingMap {
    /// Layer id to style type.
    pub layers: BTreeMap<String, String>,
    pub calls: Vec<MapCall>,
}

impl RecordingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layers<'a>(layers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            layers: layers
                .into_iter()
                .map(|(id, ty)| (id.to_string(), ty.to_string()))
                .collect(),
            calls: Vec::new(),
        }
    }

    pub fn fly_targets(&self) -> Vec<CameraState> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                MapCall::FlyTo(cam) => Some(*cam),
                _ => None,
            })
            .collect()
    }
}

impl MapSurface for RecordingMap {
    fn layer_type(&self, layer: &str) -> Option<String> {
        self.layers.get(layer).cloned()
    }

    fn set_paint_property(
        &mut self,
        layer: &str,
        property: &str,
        value: f64,
    ) -> Result<(), LayerError> {
        if !self.layers.contains_key(layer) {
            return Err(LayerError::UnknownLayer {
                layer: layer.to_string(),
            });
        }
        self.calls.push(MapCall::paint(layer, property, value));
        Ok(())
    }

    fn fly_to(&mut self, camera: &CameraState) {
        self.calls.push(MapCall::FlyTo(*camera));
    }

    fn set_marker(&mut self, at: LngLat) {
        self.calls.push(MapCall::Marker(at));
    }
}
