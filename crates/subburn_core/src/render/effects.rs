//! Mask effects: stroke dilation and shadow blur.

use image::{imageops, GrayImage, Luma};

use super::GlyphMask;

/// Grow a mask outward by `radius` pixels (a round-join outline).
///
/// Partial radii scale the coverage of the outermost ring.
pub(crate) fn dilate(mask: &GlyphMask, radius: f32) -> GlyphMask {
    if radius <= 0.0 || mask.is_empty() {
        return mask.clone();
    }

    let reach = radius.ceil() as i64;
    let padded = mask.padded(reach as u32);
    let (w, h) = (padded.width as i64, padded.height as i64);

    // Disc offsets with their weight (1 inside, fractional at the rim).
    let mut offsets = Vec::new();
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let dist = ((dx * dx + dy * dy) as f32).sqrt();
            let weight = (radius + 0.5 - dist).clamp(0.0, 1.0);
            if weight > 0.0 {
                offsets.push((dx, dy, weight));
            }
        }
    }

    let mut out = vec![0u8; padded.coverage.len()];
    for y in 0..h {
        for x in 0..w {
            let mut best = 0.0f32;
            for &(dx, dy, weight) in &offsets {
                let (sx, sy) = (x + dx, y + dy);
                if sx < 0 || sy < 0 || sx >= w || sy >= h {
                    continue;
                }
                let value = padded.get(sx as u32, sy as u32) as f32 * weight;
                if value > best {
                    best = value;
                    if best >= 255.0 {
                        break;
                    }
                }
            }
            out[(y * w + x) as usize] = best.round() as u8;
        }
    }

    GlyphMask {
        coverage: out,
        ..padded
    }
}

/// Gaussian-blurred copy of a mask, padded so the blur is not clipped.
///
/// `blur` follows the canvas shadow-blur convention (sigma = blur / 2).
pub(crate) fn blur(mask: &GlyphMask, blur: f32) -> GlyphMask {
    if blur <= 0.0 || mask.is_empty() {
        return mask.clone();
    }

    let sigma = blur / 2.0;
    let padded = mask.padded((sigma * 3.0).ceil() as u32);
    let gray = GrayImage::from_fn(padded.width, padded.height, |x, y| Luma([padded.get(x, y)]));
    let blurred = imageops::blur(&gray, sigma);

    GlyphMask {
        coverage: blurred.into_raw(),
        ..padded
    }
}
