//! Frame geometry shared by capture and compositing.

use serde::{Deserialize, Serialize};

/// Default capture width in pixels.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1920;
/// Default capture height in pixels.
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 1080;

/// Width the talking-head overlay is scaled to.
pub const OVERLAY_WIDTH: u32 = 320;
/// Distance between the overlay and the right/bottom edges.
pub const OVERLAY_MARGIN: u32 = 10;

/// Browser viewport used for page capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Placement of the overlay on the base video, anchored bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayLayout {
    /// Overlay width after scaling; height follows the aspect ratio
    pub width: u32,
    /// Margin from the right and bottom edges
    pub margin: u32,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            width: OVERLAY_WIDTH,
            margin: OVERLAY_MARGIN,
        }
    }
}

impl OverlayLayout {
    /// Top-left position of an overlay of `overlay` size inside `base`.
    ///
    /// Saturates at zero when the overlay is larger than the base.
    pub fn position(&self, base: (u32, u32), overlay: (u32, u32)) -> (u32, u32) {
        (
            base.0.saturating_sub(overlay.0).saturating_sub(self.margin),
            base.1.saturating_sub(overlay.1).saturating_sub(self.margin),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(Viewport::default(), Viewport::new(1920, 1080));
        let layout = OverlayLayout::default();
        assert_eq!(layout.width, 320);
        assert_eq!(layout.margin, 10);
    }

    #[test]
    fn test_overlay_position_bottom_right() {
        let layout = OverlayLayout::default();
        // 320x320 circle on a 1920x1080 page
        assert_eq!(layout.position((1920, 1080), (320, 320)), (1590, 750));
    }

    #[test]
    fn test_overlay_position_saturates() {
        let layout = OverlayLayout::default();
        assert_eq!(layout.position((100, 100), (320, 320)), (0, 0));
    }
}
