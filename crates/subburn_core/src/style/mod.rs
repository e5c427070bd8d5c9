//! Caption styling.
//!
//! # Components
//!
//! - **color**: CSS colour parsing and luminance
//! - **font**: font-family token resolution
//! - **preset**: named style presets

mod color;
mod font;
mod preset;

use serde::{Deserialize, Serialize};

pub use color::Color;
pub use font::{resolve_font_family, FontFamily, GENERIC_SANS};
pub use preset::StylePreset;

/// Style errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StyleError {
    #[error("Invalid colour '{0}'")]
    InvalidColor(String),

    #[error("Unknown preset '{0}'")]
    UnknownPreset(String),
}

impl StyleError {
    pub fn invalid_color(value: impl Into<String>) -> Self {
        Self::InvalidColor(value.into())
    }
}

/// Visual parameters for burned-in captions.
///
/// Treated as an immutable value: the `with_*` methods return a modified
/// copy. Defaults match the Gold preset with word emphasis on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleStyle {
    #[serde(default = "default_font_family")]
    pub font_family: String,
    /// Nominal size, scaled against the frame's reference height.
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_font_weight")]
    pub font_weight: u16,
    #[serde(default = "default_color")]
    pub color: Color,
    /// `transparent` means no background box.
    #[serde(default = "default_background")]
    pub background_color: Color,
    #[serde(default)]
    pub border_width: f32,
    #[serde(default = "default_border_color")]
    pub border_color: Color,
    #[serde(default = "default_shadow")]
    pub drop_shadow_intensity: f32,
    #[serde(default = "default_true")]
    pub word_emphasis: bool,
}

fn default_font_family() -> String {
    FontFamily::OpenSans.value().to_string()
}
fn default_font_size() -> f32 {
    20.0
}
fn default_font_weight() -> u16 {
    600
}
fn default_color() -> Color {
    Color::rgb(0xF4, 0xD3, 0x5E)
}
fn default_background() -> Color {
    Color::rgb(0x1F, 0x13, 0x00)
}
fn default_border_color() -> Color {
    Color::BLACK
}
fn default_shadow() -> f32 {
    0.4
}
fn default_true() -> bool {
    true
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            font_size: default_font_size(),
            font_weight: default_font_weight(),
            color: default_color(),
            background_color: default_background(),
            border_width: 0.0,
            border_color: default_border_color(),
            drop_shadow_intensity: default_shadow(),
            word_emphasis: true,
        }
    }
}

impl SubtitleStyle {
    /// Background colour, or `None` for the transparent sentinel.
    pub fn background(&self) -> Option<Color> {
        (!self.background_color.is_transparent()).then_some(self.background_color)
    }

    /// Silver-ish text colours get a metallic gradient fill.
    pub fn is_metallic(&self) -> bool {
        self.color.a == 255
            && (self.color.same_rgb(&Color::rgb(0xCC, 0xCC, 0xCC))
                || self.color.same_rgb(&Color::rgb(0xC0, 0xC0, 0xC0)))
    }

    /// Ordered font-family candidates for this style.
    pub fn font_candidates(&self) -> Vec<String> {
        resolve_font_family(&self.font_family)
    }

    pub fn with_font_family(&self, family: impl Into<String>) -> Self {
        Self {
            font_family: family.into(),
            ..self.clone()
        }
    }

    pub fn with_font_size(&self, size: f32) -> Self {
        Self {
            font_size: size.max(1.0),
            ..self.clone()
        }
    }

    pub fn with_font_weight(&self, weight: u16) -> Self {
        Self {
            font_weight: weight.clamp(100, 900),
            ..self.clone()
        }
    }

    pub fn with_color(&self, color: Color) -> Self {
        Self {
            color,
            ..self.clone()
        }
    }

    pub fn with_background(&self, background: Option<Color>) -> Self {
        Self {
            background_color: background.unwrap_or(Color::TRANSPARENT),
            ..self.clone()
        }
    }

    pub fn with_border(&self, width: f32, color: Color) -> Self {
        Self {
            border_width: width.max(0.0),
            border_color: color,
            ..self.clone()
        }
    }

    pub fn with_drop_shadow(&self, intensity: f32) -> Self {
        Self {
            drop_shadow_intensity: intensity.max(0.0),
            ..self.clone()
        }
    }

    pub fn with_word_emphasis(&self, enabled: bool) -> Self {
        Self {
            word_emphasis: enabled,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_gold_with_emphasis() {
        let style = SubtitleStyle::default();
        assert_eq!(style, StylePreset::Gold.apply(&style));
        assert!(style.word_emphasis);
    }

    #[test]
    fn transparent_background_is_none() {
        let style = SubtitleStyle::default().with_background(None);
        assert!(style.background().is_none());
        assert_eq!(style.background_color.to_string(), "transparent");
    }

    #[test]
    fn metallic_only_for_silver_tones() {
        let base = SubtitleStyle::default();
        assert!(base.with_color(Color::rgb(0xCC, 0xCC, 0xCC)).is_metallic());
        assert!(base.with_color(Color::rgb(0xC0, 0xC0, 0xC0)).is_metallic());
        assert!(!base.with_color(Color::rgb(0xCC, 0xCC, 0xCD)).is_metallic());
        assert!(!base.with_color(Color::WHITE).is_metallic());
    }

    #[test]
    fn with_methods_leave_original_untouched() {
        let base = SubtitleStyle::default();
        let bigger = base.with_font_size(32.0);
        assert_eq!(base.font_size, 20.0);
        assert_eq!(bigger.font_size, 32.0);
    }

    #[test]
    fn deserializes_partial_toml_like_json() {
        let style: SubtitleStyle =
            serde_json::from_str(r##"{"color": "#FFFFFF", "background_color": "transparent"}"##)
                .unwrap();
        assert_eq!(style.color, Color::WHITE);
        assert!(style.background().is_none());
        assert_eq!(style.font_weight, 600);
    }
}
