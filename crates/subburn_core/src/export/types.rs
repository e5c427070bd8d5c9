//! Export request, phases, context and results.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::logging::JobLogger;
use crate::media::{OutputFormat, OutputSpec, Quality, SourceInfo};
use crate::style::SubtitleStyle;
use crate::transcript::{DisplayMode, PhraseGrouping, Transcript};

/// Frame rate used when the caller does not pick one.
pub const DEFAULT_FPS: u32 = 30;

/// Output size when the source carries no video track to copy it from.
pub const FALLBACK_SIZE: (u32, u32) = (1920, 1080);

/// Everything the caller chooses for one export.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub source: Option<PathBuf>,
    pub transcript: Transcript,
    pub style: SubtitleStyle,
    pub mode: DisplayMode,
    pub grouping: PhraseGrouping,
    pub format: OutputFormat,
    pub quality: Quality,
    pub fps: u32,
    /// Output frame size; the source's own size when `None`.
    pub output_size: Option<(u32, u32)>,
}

impl ExportRequest {
    pub fn new(source: impl Into<PathBuf>, transcript: Transcript) -> Self {
        Self {
            source: Some(source.into()),
            transcript,
            style: SubtitleStyle::default(),
            mode: DisplayMode::default(),
            grouping: PhraseGrouping::default(),
            format: OutputFormat::default(),
            quality: Quality::default(),
            fps: DEFAULT_FPS,
            output_size: None,
        }
    }

    pub fn with_style(mut self, style: SubtitleStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_grouping(mut self, grouping: PhraseGrouping) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn with_format(mut self, format: OutputFormat, quality: Quality) -> Self {
        self.format = format;
        self.quality = quality;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_output_size(mut self, width: u32, height: u32) -> Self {
        self.output_size = Some((width, height));
        self
    }

    /// Encoder settings for a source with the given properties.
    ///
    /// Dimensions are rounded down to even values for 4:2:0 encoders.
    pub fn output_spec(&self, info: &SourceInfo) -> OutputSpec {
        let (width, height) = self
            .output_size
            .or_else(|| {
                (info.has_video && info.width > 0 && info.height > 0)
                    .then_some((info.width, info.height))
            })
            .unwrap_or(FALLBACK_SIZE);
        OutputSpec {
            format: self.format,
            quality: self.quality,
            fps: self.fps,
            width: even(width),
            height: even(height),
        }
    }
}

fn even(value: u32) -> u32 {
    (value & !1).max(2)
}

/// Where an export job stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportPhase {
    #[default]
    Idle,
    Initializing,
    DecodingSetup,
    Rendering,
    Finalizing,
    Complete,
    Cancelled,
    Failed,
}

impl ExportPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled | Self::Failed)
    }
}

impl fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Initializing => "Initializing",
            Self::DecodingSetup => "Decoding setup",
            Self::Rendering => "Rendering",
            Self::Finalizing => "Finalizing",
            Self::Complete => "Complete",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Progress callback type.
///
/// Arguments: (phase, percent_complete, status)
pub type ProgressCallback = Box<dyn Fn(ExportPhase, f32, &str) + Send + Sync>;

/// Read-only inputs for one export job.
pub struct ExportContext {
    pub request: ExportRequest,
    pub job_name: String,
    pub logger: Arc<JobLogger>,
    progress_callback: Option<ProgressCallback>,
}

impl ExportContext {
    pub fn new(request: ExportRequest, job_name: impl Into<String>, logger: Arc<JobLogger>) -> Self {
        Self {
            request,
            job_name: job_name.into(),
            logger,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, phase: ExportPhase, percent: f32, status: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(phase, percent, status);
        }
    }
}

/// A finished export held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub file_name: String,
}

impl ExportArtifact {
    pub fn new(bytes: Vec<u8>, format: OutputFormat, created: DateTime<Utc>) -> Self {
        Self {
            bytes,
            mime_type: format.mime_type(),
            file_name: artifact_file_name(format, created),
        }
    }

    /// Write the artifact into `dir`, returning the full path.
    ///
    /// The file appears under its final name only once fully written.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let path = dir.join(&self.file_name);
        let temp_path = dir.join(format!("{}.tmp", self.file_name));
        fs::write(&temp_path, &self.bytes)?;
        fs::rename(&temp_path, &path)?;

        tracing::info!(
            "[Export] Wrote {} ({} bytes)",
            path.display(),
            self.bytes.len()
        );
        Ok(path)
    }
}

/// `video_with_subtitles_<timestamp>.<ext>` with `:` and `.` in the
/// timestamp replaced so the name is portable.
pub fn artifact_file_name(format: OutputFormat, created: DateTime<Utc>) -> String {
    let stamp = created
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("video_with_subtitles_{}.{}", stamp, format.extension())
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Complete(ExportArtifact),
    Cancelled,
}

impl ExportOutcome {
    pub fn artifact(&self) -> Option<&ExportArtifact> {
        match self {
            Self::Complete(artifact) => Some(artifact),
            Self::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn info(width: u32, height: u32, has_video: bool) -> SourceInfo {
        SourceInfo {
            duration: 1.0,
            width,
            height,
            fps: None,
            has_video,
            has_audio: false,
        }
    }

    #[test]
    fn file_name_embeds_portable_timestamp() {
        let created = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(
            artifact_file_name(OutputFormat::WebM, created),
            "video_with_subtitles_2024-03-05T14-07-09-000Z.webm"
        );
    }

    #[test]
    fn output_spec_follows_source_then_override() {
        let request = ExportRequest::new("in.mp4", Transcript::default());
        let spec = request.output_spec(&info(1080, 1920, true));
        assert_eq!((spec.width, spec.height, spec.fps), (1080, 1920, 30));

        let request = request.with_output_size(1280, 720);
        let spec = request.output_spec(&info(1080, 1920, true));
        assert_eq!((spec.width, spec.height), (1280, 720));
    }

    #[test]
    fn output_spec_rounds_to_even_and_falls_back_without_video() {
        let request = ExportRequest::new("in.mp4", Transcript::default());
        let spec = request.output_spec(&info(641, 361, true));
        assert_eq!((spec.width, spec.height), (640, 360));

        let spec = request.output_spec(&info(0, 0, false));
        assert_eq!((spec.width, spec.height), FALLBACK_SIZE);
    }

    #[test]
    fn artifact_writes_under_final_name() {
        let dir = tempdir().unwrap();
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let artifact = ExportArtifact::new(vec![1, 2, 3], OutputFormat::Mp4, created);
        assert_eq!(artifact.mime_type, "video/mp4");

        let path = artifact.write_to(dir.path().join("out")).unwrap();
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);
        assert!(!dir
            .path()
            .join("out")
            .join(format!("{}.tmp", artifact.file_name))
            .exists());
    }

    #[test]
    fn terminal_phases() {
        assert!(ExportPhase::Cancelled.is_terminal());
        assert!(!ExportPhase::Rendering.is_terminal());
        assert_eq!(ExportPhase::DecodingSetup.to_string(), "Decoding setup");
    }
}
