use serde::{Deserialize, Serialize};

/// Longitude/latitude pair in degrees, stored in `[lng, lat]` order.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(v: LngLat) -> Self {
        [v.lng, v.lat]
    }
}

/// Map viewpoint for a chapter.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub center: LngLat,
    pub zoom: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub bearing: f64,
}

impl CameraState {
    pub const fn new(center: LngLat, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            pitch: 0.0,
            bearing: 0.0,
        }
    }

    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = bearing;
        self
    }

    /// Name of the first non-finite component, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        if !self.center.is_finite() {
            Some("center")
        } else if !self.zoom.is_finite() {
            Some("zoom")
        } else if !self.pitch.is_finite() {
            Some("pitch")
        } else if !self.bearing.is_finite() {
            Some("bearing")
        } else {
            None
        }
    }
}
