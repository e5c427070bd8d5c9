//! Subtitle layout engine.
//!
//! Turns a display unit, a style and a frame size into a [`RenderPlan`]:
//! positioned, upper-cased text runs with their fills and effects. Text
//! widths come from a [`TextMeasure`] so layout is independent of any font
//! backend.

mod metrics;
mod plan;
mod split;

pub use metrics::FrameMetrics;
pub use plan::{plan_caption, Fill, RenderPlan, RoundedBox, Shadow, Stroke, TextRun};
pub use split::{split_lines, split_point};

/// Font request for measuring or rasterizing a run.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Family candidates in preference order.
    pub families: Vec<String>,
    pub weight: u16,
    pub size_px: f32,
}

impl FontSpec {
    pub fn new(families: Vec<String>, weight: u16, size_px: f32) -> Self {
        Self {
            families,
            weight,
            size_px,
        }
    }

    /// Same font at `scale` times the size.
    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            size_px: self.size_px * scale,
            ..self.clone()
        }
    }
}

/// Text advance-width measurement.
pub trait TextMeasure {
    /// Width in pixels of `text` set in `font`.
    fn measure(&self, text: &str, font: &FontSpec) -> f32;
}
