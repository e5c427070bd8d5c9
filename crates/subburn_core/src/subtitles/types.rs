//! Subtitle file types.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported caption file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    /// SubRip (.srt)
    #[default]
    Srt,
    /// WebVTT (.vtt)
    #[serde(rename = "vtt")]
    WebVtt,
    /// Transcript dump (.json)
    Json,
}

impl SubtitleFormat {
    /// Detect format from file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "srt" => Some(Self::Srt),
            "vtt" => Some(Self::WebVtt),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Get the typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::WebVtt => "vtt",
            Self::Json => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Srt => "text/plain",
            Self::WebVtt => "text/vtt",
            Self::Json => "application/json",
        }
    }

    /// Download name used when the caller does not choose one.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Self::Srt => "subtitles.srt",
            Self::WebVtt => "subtitles.vtt",
            Self::Json => "transcript.json",
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SubtitleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" | "webvtt" => Ok(Self::WebVtt),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown subtitle format '{}'", other)),
        }
    }
}

/// One timed cue read back from a caption file.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    /// 1-based position in the file.
    pub index: usize,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Cue text; multi-line cues keep their `\n` separators.
    pub text: String,
}

impl SubtitleCue {
    pub fn new(index: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
