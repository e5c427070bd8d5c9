//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::media::{OutputFormat, Quality};
use crate::style::SubtitleStyle;
use crate::transcript::{DisplayMode, PhraseGrouping};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    /// Defaults for `burn` when the command line leaves them out.
    #[serde(default)]
    pub export: ExportSettings,

    #[serde(default)]
    pub style: SubtitleStyle,

    /// Phrase-mode grouping policy.
    #[serde(default)]
    pub phrases: PhraseGrouping,
}

/// Output, log, font and scratch directories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Where exported videos and subtitle files go.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Folder scanned for `.ttf`/`.otf` caption fonts.
    #[serde(default = "default_fonts_folder")]
    pub fonts_folder: String,

    /// Family used for `sans-serif` and for families with no installed face.
    #[serde(default = "default_fallback_font")]
    pub fallback_font: String,

    /// Scratch space for encoder intermediates.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,
}

fn default_output_folder() -> String {
    "subburn_output".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

fn default_fonts_folder() -> String {
    "fonts".to_string()
}

fn default_fallback_font() -> String {
    "DejaVu Sans".to_string()
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
            fonts_folder: default_fonts_folder(),
            fallback_font: default_fallback_font(),
            temp_root: default_temp_root(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub level: LogLevel,

    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Number of encoder diagnostic lines shown after a failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: usize,

    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> usize {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            compact: true,
            progress_step: default_progress_step(),
            error_tail: default_error_tail(),
            show_timestamps: true,
        }
    }
}

/// Export defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub quality: Quality,

    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default)]
    pub mode: DisplayMode,
}

fn default_fps() -> u32 {
    crate::export::DEFAULT_FPS
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: Quality::default(),
            fps: default_fps(),
            mode: DisplayMode::default(),
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Export,
    Style,
    Phrases,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Export,
        ConfigSection::Style,
        ConfigSection::Phrases,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Export => "export",
            ConfigSection::Style => "style",
            ConfigSection::Phrases => "phrases",
        }
    }

    /// Comment line written above the table in a fresh config file.
    pub(super) fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "# Output and working directories",
            ConfigSection::Logging => "# Logging configuration",
            ConfigSection::Export => "# Video export defaults",
            ConfigSection::Style => "# Caption appearance",
            ConfigSection::Phrases => "# Phrase grouping for phrase display mode",
        }
    }
}
