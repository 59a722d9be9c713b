use serde::{Deserialize, Serialize};

use scribe_doc::{Document, NodeKey};

/// Screen position of the overlay's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlayPoint {
    pub x: f32,
    pub y: f32,
}

impl OverlayPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True for the degenerate rect a caret inside an empty element produces:
    /// there is no glyph to bound, so both dimensions collapse.
    pub fn is_zero_sized(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    pub fn bottom_left(&self) -> OverlayPoint {
        OverlayPoint::new(self.x, self.y + self.height)
    }
}

/// Measurement seam to the renderer. The engine never walks layout itself; it
/// only asks for the two rects the host can answer from its own geometry.
pub trait Viewport {
    fn selection_rect(&self, doc: &Document) -> Option<Rect>;
    fn node_rect(&self, doc: &Document, key: NodeKey) -> Option<Rect>;
}
