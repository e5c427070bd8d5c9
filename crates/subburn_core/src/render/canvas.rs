//! Pixel-level painting on an RGBA frame.

use image::{Rgba, RgbaImage};

use crate::layout::RoundedBox;
use crate::style::Color;

use super::GlyphMask;

/// Source-over blend of `color` at `coverage` (0..=1) onto one pixel.
pub(crate) fn blend_pixel(image: &mut RgbaImage, x: i64, y: i64, color: Color, coverage: f32) {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }
    let src_a = color.a as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }

    let Rgba([dr, dg, db, da]) = *image.get_pixel(x as u32, y as u32);
    let dst_a = da as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    let mix = |s: u8, d: u8| {
        let value = (s as f32 * src_a + d as f32 * dst_a * (1.0 - src_a)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };

    image.put_pixel(
        x as u32,
        y as u32,
        Rgba([
            mix(color.r, dr),
            mix(color.g, dg),
            mix(color.b, db),
            (out_a * 255.0).round() as u8,
        ]),
    );
}

/// Signed distance from `(px, py)` to a rounded rectangle (negative inside).
fn rounded_rect_distance(rect: &RoundedBox, px: f32, py: f32) -> f32 {
    let (cx, cy) = rect.center();
    let half_w = rect.width / 2.0;
    let half_h = rect.height / 2.0;
    let radius = rect.radius.clamp(0.0, half_w.min(half_h));

    let qx = (px - cx).abs() - (half_w - radius);
    let qy = (py - cy).abs() - (half_h - radius);
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    let inside = qx.max(qy).min(0.0);
    outside + inside - radius
}

/// Fill an anti-aliased rounded rectangle.
pub(crate) fn fill_rounded_rect(image: &mut RgbaImage, rect: &RoundedBox) {
    if rect.width <= 0.0 || rect.height <= 0.0 || rect.color.is_transparent() {
        return;
    }

    let x0 = rect.x.floor().max(0.0) as i64;
    let y0 = rect.y.floor().max(0.0) as i64;
    let x1 = ((rect.x + rect.width).ceil() as i64).min(image.width() as i64);
    let y1 = ((rect.y + rect.height).ceil() as i64).min(image.height() as i64);

    for y in y0..y1 {
        for x in x0..x1 {
            let d = rounded_rect_distance(rect, x as f32 + 0.5, y as f32 + 0.5);
            let coverage = (0.5 - d).clamp(0.0, 1.0);
            if coverage > 0.0 {
                blend_pixel(image, x, y, rect.color, coverage);
            }
        }
    }
}

/// Composite a coverage mask whose top-left corner sits at `(left, top)`.
///
/// `paint` picks the colour for each frame row.
pub(crate) fn paint_mask<F>(image: &mut RgbaImage, mask: &GlyphMask, left: f32, top: f32, paint: F)
where
    F: Fn(i64) -> Color,
{
    let left = left.round() as i64;
    let top = top.round() as i64;

    for my in 0..mask.height {
        let y = top + my as i64;
        if y < 0 || y >= image.height() as i64 {
            continue;
        }
        let color = paint(y);
        for mx in 0..mask.width {
            let coverage = mask.get(mx, my);
            if coverage == 0 {
                continue;
            }
            blend_pixel(image, left + mx as i64, y, color, coverage as f32 / 255.0);
        }
    }
}
