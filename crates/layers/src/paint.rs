use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Style layer types whose opacity a story can drive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    Fill,
    Line,
    Circle,
    Symbol,
    Raster,
    FillExtrusion,
}

impl LayerKind {
    pub const ALL: [LayerKind; 6] = [
        LayerKind::Fill,
        LayerKind::Line,
        LayerKind::Circle,
        LayerKind::Symbol,
        LayerKind::Raster,
        LayerKind::FillExtrusion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Fill => "fill",
            LayerKind::Line => "line",
            LayerKind::Circle => "circle",
            LayerKind::Symbol => "symbol",
            LayerKind::Raster => "raster",
            LayerKind::FillExtrusion => "fill-extrusion",
        }
    }

    /// Paint properties that together make up the layer's opacity.
    pub fn opacity_properties(self) -> &'static [&'static str] {
        match self {
            LayerKind::Fill => &["fill-opacity"],
            LayerKind::Line => &["line-opacity"],
            LayerKind::Circle => &["circle-opacity", "circle-stroke-opacity"],
            LayerKind::Symbol => &["icon-opacity", "text-opacity"],
            LayerKind::Raster => &["raster-opacity"],
            LayerKind::FillExtrusion => &["fill-extrusion-opacity"],
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLayerKind(pub String);

impl fmt::Display for UnknownLayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer type '{}' has no opacity property", self.0)
    }
}

impl std::error::Error for UnknownLayerKind {}

impl FromStr for LayerKind {
    type Err = UnknownLayerKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayerKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownLayerKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::LayerKind;

    #[test]
    fn parses_every_style_type() {
        for kind in LayerKind::ALL {
            assert_eq!(kind.as_str().parse::<LayerKind>(), Ok(kind));
        }
        assert!("heatmap".parse::<LayerKind>().is_err());
    }

    #[test]
    fn opacity_property_table() {
        assert_eq!(LayerKind::Fill.opacity_properties(), &["fill-opacity"]);
        assert_eq!(
            LayerKind::Circle.opacity_properties(),
            &["circle-opacity", "circle-stroke-opacity"]
        );
        assert_eq!(
            LayerKind::Symbol.opacity_properties(),
            &["icon-opacity", "text-opacity"]
        );
        assert_eq!(
            LayerKind::FillExtrusion.opacity_properties(),
            &["fill-extrusion-opacity"]
        );
    }
}
