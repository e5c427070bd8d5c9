//! Frame-relative caption metrics.

/// Reference frame heights the nominal font size is designed against.
const PORTRAIT_REFERENCE_HEIGHT: f32 = 1920.0;
const LANDSCAPE_REFERENCE_HEIGHT: f32 = 1080.0;

/// Nominal-to-pixel font size factor.
const FONT_SIZE_FACTOR: f32 = 1.5;

/// Caption centre offset from the bottom, as a share of frame height.
const PORTRAIT_BOTTOM_MARGIN: f32 = 0.08;
const LANDSCAPE_BOTTOM_MARGIN: f32 = 0.16;

const PORTRAIT_WORDS_PER_LINE: usize = 4;
const LANDSCAPE_WORDS_PER_LINE: usize = 6;

/// Geometry derived from the output frame size and the nominal font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMetrics {
    pub width: u32,
    pub height: u32,
    /// Portrait frame (`height > width`).
    pub vertical: bool,
    /// Frame height relative to the reference height.
    pub scale: f32,
    /// Rendered font size in pixels.
    pub font_px: f32,
    /// Horizontal caption centre.
    pub center_x: f32,
    /// Vertical centre of the caption block.
    pub baseline_y: f32,
    pub max_words_per_line: usize,
}

impl FrameMetrics {
    pub fn new(width: u32, height: u32, font_size: f32) -> Self {
        let vertical = height > width;
        let h = height as f32;

        let reference = if vertical {
            PORTRAIT_REFERENCE_HEIGHT
        } else {
            LANDSCAPE_REFERENCE_HEIGHT
        };
        let scale = h / reference;
        let margin = if vertical {
            PORTRAIT_BOTTOM_MARGIN
        } else {
            LANDSCAPE_BOTTOM_MARGIN
        };

        Self {
            width,
            height,
            vertical,
            scale,
            font_px: (font_size * scale * FONT_SIZE_FACTOR).round(),
            center_x: width as f32 / 2.0,
            baseline_y: h - h * margin,
            max_words_per_line: if vertical {
                PORTRAIT_WORDS_PER_LINE
            } else {
                LANDSCAPE_WORDS_PER_LINE
            },
        }
    }

    /// Gap between stacked lines.
    pub fn line_gap(&self) -> f32 {
        4.0 * self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_1080p() {
        let m = FrameMetrics::new(1920, 1080, 20.0);
        assert!(!m.vertical);
        assert_eq!(m.scale, 1.0);
        assert_eq!(m.font_px, 30.0);
        assert_eq!(m.center_x, 960.0);
        assert!((m.baseline_y - 907.2).abs() < 1e-3);
        assert_eq!(m.max_words_per_line, 6);
    }

    #[test]
    fn portrait_720p() {
        let m = FrameMetrics::new(720, 1280, 20.0);
        assert!(m.vertical);
        assert!((m.scale - 1280.0 / 1920.0).abs() < 1e-6);
        assert_eq!(m.font_px, 20.0);
        assert!((m.baseline_y - 1177.6).abs() < 1e-3);
        assert_eq!(m.max_words_per_line, 4);
    }

    #[test]
    fn square_counts_as_landscape() {
        assert!(!FrameMetrics::new(1080, 1080, 20.0).vertical);
    }
}
