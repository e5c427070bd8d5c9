//! FFmpeg subprocess backend.

mod decode;
mod encode;
mod probe;

use std::path::{Path, PathBuf};
use std::process::Command;

pub use decode::{decode_audio_track, FfmpegFrameCursor, FfmpegSource};
pub use encode::FfmpegSink;
pub use probe::{parse_probe_json, parse_rate, probe_source};

use super::{MediaBackend, MediaResult, MediaSink, MediaSource, OutputSpec};

/// [`MediaBackend`] driving `ffprobe` and `ffmpeg`.
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    temp_dir: Option<PathBuf>,
}

impl FfmpegBackend {
    /// Backend whose encoder scratch files go under `temp_dir` (system temp
    /// when `None`).
    pub fn new(temp_dir: Option<PathBuf>) -> Self {
        Self { temp_dir }
    }

    /// Check that both `ffmpeg` and `ffprobe` run.
    pub fn is_available() -> bool {
        ["ffmpeg", "ffprobe"].iter().all(|tool| {
            Command::new(tool)
                .arg("-version")
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        })
    }
}

impl MediaBackend for FfmpegBackend {
    fn open(&self, path: &Path) -> MediaResult<Box<dyn MediaSource>> {
        Ok(Box::new(FfmpegSource::open(path)?))
    }

    fn create_sink(&self, spec: &OutputSpec) -> MediaResult<Box<dyn MediaSink>> {
        Ok(Box::new(FfmpegSink::new(spec, self.temp_dir.as_deref())?))
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tempfile::tempdir;

    use crate::export::{ExportContext, ExportJob, ExportRequest, Exporter};
    use crate::logging::{JobLogger, LogConfig};
    use crate::media::{OutputFormat, Quality};
    use crate::test_support::FixedWidthText;
    use crate::transcript::{DisplayMode, Transcript, TranscriptChunk};

    fn has_encoder(name: &str) -> bool {
        Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains(name))
            .unwrap_or(false)
    }

    /// One second of `testsrc` video with a sine tone.
    fn generate_clip(path: &Path) -> bool {
        Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-f", "lavfi", "-i", "testsrc=size=160x90:rate=10:duration=1"])
            .args(["-f", "lavfi", "-i", "sine=frequency=440:duration=1"])
            .args(["-c:v", "mpeg4", "-c:a", "aac", "-shortest"])
            .arg(path)
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[test]
    fn burns_captions_into_generated_clip() {
        if !FfmpegBackend::is_available() || !has_encoder("libx264") {
            return;
        }
        let dir = tempdir().unwrap();
        let clip = dir.path().join("clip.mp4");
        assert!(generate_clip(&clip), "ffmpeg could not generate the test clip");

        let scratch = dir.path().join("scratch");
        std::fs::create_dir_all(&scratch).unwrap();
        let backend = Arc::new(FfmpegBackend::new(Some(scratch.clone())));
        let exporter = Exporter::new(backend, Arc::new(FixedWidthText));

        let transcript = Transcript::from_chunks(vec![
            TranscriptChunk::new("hello", 0.0, 0.5),
            TranscriptChunk::new("world", 0.5, 1.0),
        ]);
        let request = ExportRequest::new(clip.clone(), transcript)
            .with_mode(DisplayMode::Phrase)
            .with_format(OutputFormat::Mp4, Quality::Low)
            .with_fps(10);
        let logger = JobLogger::new("clip", dir.path().join("logs"), LogConfig::default(), None);
        let ctx = ExportContext::new(request, "clip", Arc::new(logger.unwrap()));

        let mut job = ExportJob::new();
        let outcome = exporter.run(&ctx, &mut job).unwrap();
        let artifact = outcome.artifact().unwrap();
        assert_eq!(artifact.mime_type, "video/mp4");
        assert!(!artifact.bytes.is_empty());
        assert!(!job.holds_handles());

        // Scratch output is removed once the bytes are read back.
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);

        let written = artifact.write_to(dir.path().join("out")).unwrap();
        let rendered = FfmpegBackend::default().open(&written).unwrap();
        let info = rendered.info();
        assert_eq!((info.width, info.height), (160, 90));
        assert!(info.has_audio);
        assert!((info.duration - 1.0).abs() < 0.3, "duration {}", info.duration);
    }

    #[test]
    fn availability_check_does_not_panic() {
        let _available = FfmpegBackend::is_available();
    }

    #[test]
    fn open_missing_file_fails() {
        let backend = FfmpegBackend::default();
        assert!(backend.open(Path::new("/nonexistent/clip.mp4")).is_err());
    }
}
