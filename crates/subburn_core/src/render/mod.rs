//! Frame renderer.
//!
//! Paints a [`RenderPlan`] onto an RGBA frame: background box, then for each
//! run its highlight, stroke, drop shadow and fill, all composited
//! source-over.
//!
//! # Components
//!
//! - **canvas**: pixel blending and rounded rectangles
//! - **effects**: stroke dilation and shadow blur on coverage masks
//! - **fonts**: font library and the fontdue rasterizer

mod canvas;
mod effects;
mod fonts;

use image::RgbaImage;

use crate::layout::{Fill, FontSpec, RenderPlan, TextMeasure, TextRun};
use crate::style::Color;

pub use fonts::{parse_font_stem, FontError, FontFace, FontLibrary, FontdueText};

const METALLIC_STOPS: [Color; 3] = [
    Color::rgb(0xFF, 0xFF, 0xFF),
    Color::rgb(0xCC, 0xCC, 0xCC),
    Color::rgb(0x99, 0x99, 0x99),
];

/// An 8-bit coverage mask for a piece of text.
///
/// `anchor_x`/`anchor_y` locate the text's horizontal centre and vertical
/// middle inside the mask.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphMask {
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<u8>,
    pub anchor_x: f32,
    pub anchor_y: f32,
}

impl GlyphMask {
    pub fn new(width: u32, height: u32, coverage: Vec<u8>, anchor_x: f32, anchor_y: f32) -> Self {
        Self {
            width,
            height,
            coverage,
            anchor_x,
            anchor_y,
        }
    }

    pub fn empty() -> Self {
        Self::new(0, 0, Vec::new(), 0.0, 0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.coverage.iter().all(|&c| c == 0)
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.coverage[(y * self.width + x) as usize]
    }

    /// Raise coverage at `(x, y)` to at least `value`.
    pub fn max_at(&mut self, x: i64, y: i64, value: u8) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as u32 * self.width + x as u32) as usize;
        self.coverage[idx] = self.coverage[idx].max(value);
    }

    /// Copy with `pad` empty pixels on every side.
    pub fn padded(&self, pad: u32) -> Self {
        let width = self.width + pad * 2;
        let height = self.height + pad * 2;
        let mut coverage = vec![0u8; (width * height) as usize];
        for y in 0..self.height {
            let src = (y * self.width) as usize;
            let dst = ((y + pad) * width + pad) as usize;
            coverage[dst..dst + self.width as usize]
                .copy_from_slice(&self.coverage[src..src + self.width as usize]);
        }
        Self {
            width,
            height,
            coverage,
            anchor_x: self.anchor_x + pad as f32,
            anchor_y: self.anchor_y + pad as f32,
        }
    }
}

/// Text backend able to both measure and rasterize.
pub trait TextRaster: TextMeasure {
    fn rasterize(&self, text: &str, font: &FontSpec) -> GlyphMask;
}

/// Draws caption plans onto frames.
pub struct FrameRenderer<'a> {
    text: &'a dyn TextRaster,
}

impl<'a> FrameRenderer<'a> {
    pub fn new(text: &'a dyn TextRaster) -> Self {
        Self { text }
    }

    /// The text backend, also used to measure runs during layout.
    pub fn text(&self) -> &'a dyn TextRaster {
        self.text
    }

    /// Paint `plan` onto `frame`.
    pub fn draw(&self, frame: &mut RgbaImage, plan: &RenderPlan) {
        if plan.is_empty() {
            return;
        }

        if let Some(background) = &plan.background {
            canvas::fill_rounded_rect(frame, background);
        }

        for run in plan.runs() {
            self.draw_run(frame, run);
        }
    }

    fn draw_run(&self, frame: &mut RgbaImage, run: &TextRun) {
        if let Some(highlight) = &run.highlight {
            canvas::fill_rounded_rect(frame, highlight);
        }

        let mask = self.text.rasterize(&run.text, &run.font);
        if mask.is_empty() {
            return;
        }

        if let Some(stroke) = &run.stroke {
            let outline = effects::dilate(&mask, stroke.width / 2.0);
            let (left, top) = mask_origin(&outline, run.center_x, run.center_y);
            canvas::paint_mask(frame, &outline, left, top, |_| stroke.color);
        }

        if let Some(shadow) = &run.shadow {
            let soft = effects::blur(&mask, shadow.blur);
            let (left, top) = mask_origin(&soft, run.center_x, run.center_y);
            canvas::paint_mask(
                frame,
                &soft,
                left + shadow.offset,
                top + shadow.offset,
                |_| shadow.color,
            );
        }

        let (left, top) = mask_origin(&mask, run.center_x, run.center_y);
        match run.fill {
            Fill::Solid(color) => canvas::paint_mask(frame, &mask, left, top, |_| color),
            Fill::Metallic { half_height } => {
                let center_y = run.center_y;
                canvas::paint_mask(frame, &mask, left, top, |y| {
                    metallic_color(y as f32 + 0.5, center_y, half_height)
                })
            }
        }
    }
}

/// Top-left frame position of a mask anchored at `(cx, cy)`.
fn mask_origin(mask: &GlyphMask, cx: f32, cy: f32) -> (f32, f32) {
    (cx - mask.anchor_x, cy - mask.anchor_y)
}

/// Vertical gradient colour at frame row `y`.
fn metallic_color(y: f32, center_y: f32, half_height: f32) -> Color {
    let span = (half_height * 2.0).max(f32::EPSILON);
    let t = ((y - (center_y - half_height)) / span).clamp(0.0, 1.0);
    if t <= 0.5 {
        METALLIC_STOPS[0].lerp(METALLIC_STOPS[1], t * 2.0)
    } else {
        METALLIC_STOPS[1].lerp(METALLIC_STOPS[2], (t - 0.5) * 2.0)
    }
}
