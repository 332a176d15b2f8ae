//! Pixel mapping for the curve plot.
//!
//! A [`Plot`] is rebuilt from the canvas bounds on every draw and event
//! pass, so a layout change can never leave a stale mapping behind.

use crate::curve::NORM_MAX;
use iced::{Point, Rectangle, Size};

/// Space reserved on the left for delay-axis labels.
pub const LEFT_GUTTER: f32 = 52.0;
/// Space reserved below the plot for slot-axis labels.
pub const BOTTOM_GUTTER: f32 = 26.0;
/// Breathing room on the top and right edges.
pub const EDGE_PADDING: f32 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plot {
    inner: Rectangle,
}

impl Plot {
    pub fn new(size: Size) -> Self {
        let width = (size.width - LEFT_GUTTER - EDGE_PADDING).max(1.0);
        let height = (size.height - BOTTOM_GUTTER - EDGE_PADDING).max(1.0);
        Self {
            inner: Rectangle {
                x: LEFT_GUTTER,
                y: EDGE_PADDING,
                width,
                height,
            },
        }
    }

    /// The plotting area in canvas-local pixels, axis gutters excluded.
    pub fn inner(&self) -> Rectangle {
        self.inner
    }

    /// Map a normalized slot position to a horizontal pixel.
    pub fn x_to_px(&self, x: f64) -> f32 {
        self.inner.x + (x / NORM_MAX) as f32 * self.inner.width
    }

    /// Map a normalized delay to a vertical pixel. The axis is inverted:
    /// 100 sits at the top edge, 0 at the bottom.
    pub fn y_to_px(&self, y: f64) -> f32 {
        self.inner.y + (1.0 - y / NORM_MAX) as f32 * self.inner.height
    }

    /// Map a vertical pixel back to a normalized delay. Pointer positions
    /// outside the plotting area clamp onto its edge.
    pub fn y_from_px(&self, py: f32) -> f64 {
        let fraction = ((self.inner.y + self.inner.height - py) / self.inner.height) as f64;
        (fraction * NORM_MAX).clamp(0.0, NORM_MAX)
    }

    pub fn marker_point(&self, x: f64, y: f64) -> Point {
        Point::new(self.x_to_px(x), self.y_to_px(y))
    }
}
