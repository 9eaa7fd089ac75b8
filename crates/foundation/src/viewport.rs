/// Width below which the story is laid out for narrow screens.
pub const NARROW_VIEWPORT_THRESHOLD_PX: f64 = 775.0;

/// Available screen size at startup, in CSS pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_narrow(&self, threshold_px: f64) -> bool {
        self.width < threshold_px
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NARROW_VIEWPORT_THRESHOLD_PX, Viewport};

    #[test]
    fn threshold_is_exclusive() {
        assert!(Viewport::new(774.0, 600.0).is_narrow(NARROW_VIEWPORT_THRESHOLD_PX));
        assert!(!Viewport::new(775.0, 600.0).is_narrow(NARROW_VIEWPORT_THRESHOLD_PX));
    }
}
