//! Media value types shared by the backend traits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Container of the exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp4,
    WebM,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::WebM => "webm",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "video/mp4",
            OutputFormat::WebM => "video/webm",
        }
    }

    /// Video codec name (`avc` or `vp9`).
    pub fn video_codec(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "avc",
            OutputFormat::WebM => "vp9",
        }
    }

    /// Audio codec name (`aac` or `opus`).
    pub fn audio_codec(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "aac",
            OutputFormat::WebM => "opus",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "webm" => Ok(Self::WebM),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Encoder quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Low,
    Medium,
    #[default]
    High,
    VeryHigh,
}

/// Video bitrate for a 1080p frame at the `Medium` preset.
const REFERENCE_VIDEO_BITRATE: f64 = 4_000_000.0;
const REFERENCE_PIXELS: f64 = 1920.0 * 1080.0;

impl Quality {
    fn factor(&self) -> f64 {
        match self {
            Quality::Low => 0.5,
            Quality::Medium => 1.0,
            Quality::High => 2.0,
            Quality::VeryHigh => 4.0,
        }
    }

    /// Target video bitrate in bits/s, scaled by frame area.
    pub fn video_bitrate(&self, width: u32, height: u32) -> u64 {
        let area = (width as f64 * height as f64 / REFERENCE_PIXELS).max(0.05);
        (REFERENCE_VIDEO_BITRATE * self.factor() * area).round() as u64
    }

    /// Target audio bitrate in bits/s.
    pub fn audio_bitrate(&self) -> u64 {
        match self {
            Quality::Low => 64_000,
            Quality::Medium => 96_000,
            Quality::High => 128_000,
            Quality::VeryHigh => 192_000,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
            Quality::VeryHigh => "very_high",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "very_high" | "veryhigh" => Ok(Self::VeryHigh),
            other => Err(format!("unknown quality '{}'", other)),
        }
    }
}

/// Everything an encoder sink needs to know up front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSpec {
    pub format: OutputFormat,
    pub quality: Quality,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

impl OutputSpec {
    pub fn video_bitrate(&self) -> u64 {
        self.quality.video_bitrate(self.width, self.height)
    }

    pub fn audio_bitrate(&self) -> u64 {
        self.quality.audio_bitrate()
    }
}

/// Probed properties of the source video.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    /// Duration in seconds.
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Native frame rate, if known.
    pub fps: Option<f64>,
    pub has_video: bool,
    pub has_audio: bool,
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self {
            duration: 0.0,
            width: 0,
            height: 0,
            fps: None,
            has_video: true,
            has_audio: false,
        }
    }
}

/// Fully decoded audio track as interleaved `f32` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Little-endian `f32` bytes, the layout ffmpeg's `f32le` reads.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    /// Build from little-endian `f32` bytes; a trailing partial sample is dropped.
    pub fn from_le_bytes(sample_rate: u32, channels: u16, bytes: &[u8]) -> Self {
        let samples = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Self::new(sample_rate, channels, samples)
    }
}
