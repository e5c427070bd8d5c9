//! Named style presets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Color, FontFamily, StyleError, SubtitleStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StylePreset {
    Green,
    Gold,
    Subtitle,
    Gamer,
}

impl StylePreset {
    pub const ALL: [StylePreset; 4] = [
        StylePreset::Green,
        StylePreset::Gold,
        StylePreset::Subtitle,
        StylePreset::Gamer,
    ];

    /// Apply the preset on top of `base`.
    ///
    /// Word emphasis is not part of a preset and is carried over from `base`.
    pub fn apply(&self, base: &SubtitleStyle) -> SubtitleStyle {
        let (family, size, weight, color, background, border_color, shadow) = match self {
            StylePreset::Green => (
                FontFamily::Roboto,
                20.0,
                600,
                Color::rgb(0x00, 0xFF, 0x41),
                Color::rgb(0x0B, 0x0B, 0x0B),
                Color::BLACK,
                0.4,
            ),
            StylePreset::Gold => (
                FontFamily::OpenSans,
                20.0,
                600,
                Color::rgb(0xF4, 0xD3, 0x5E),
                Color::rgb(0x1F, 0x13, 0x00),
                Color::BLACK,
                0.4,
            ),
            StylePreset::Subtitle => (
                FontFamily::Arial,
                20.0,
                500,
                Color::WHITE,
                Color::rgba(0, 0, 0, 191),
                Color::BLACK,
                0.3,
            ),
            StylePreset::Gamer => (
                FontFamily::Verdana,
                24.0,
                700,
                Color::rgb(0x94, 0xFB, 0xAB),
                Color::rgb(0x14, 0x14, 0x14),
                Color::rgb(0xFF, 0x00, 0xFF),
                0.6,
            ),
        };

        SubtitleStyle {
            font_family: family.value().to_string(),
            font_size: size,
            font_weight: weight,
            color,
            background_color: background,
            border_width: 0.0,
            border_color,
            drop_shadow_intensity: shadow,
            word_emphasis: base.word_emphasis,
        }
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StylePreset::Green => "green",
            StylePreset::Gold => "gold",
            StylePreset::Subtitle => "subtitle",
            StylePreset::Gamer => "gamer",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for StylePreset {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StylePreset::ALL
            .into_iter()
            .find(|p| p.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StyleError::UnknownPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_keeps_emphasis_flag() {
        let base = SubtitleStyle::default().with_word_emphasis(false);
        let gamer = StylePreset::Gamer.apply(&base);
        assert!(!gamer.word_emphasis);
        assert_eq!(gamer.font_size, 24.0);
        assert_eq!(gamer.border_color.to_string(), "#FF00FF");
    }

    #[test]
    fn subtitle_preset_background_is_translucent() {
        let style = StylePreset::Subtitle.apply(&SubtitleStyle::default());
        assert_eq!(style.background_color.to_string(), "rgba(0, 0, 0, 0.75)");
    }

    #[test]
    fn parses_names() {
        assert_eq!("Gold".parse::<StylePreset>().unwrap(), StylePreset::Gold);
        assert!("neon".parse::<StylePreset>().is_err());
    }
}
