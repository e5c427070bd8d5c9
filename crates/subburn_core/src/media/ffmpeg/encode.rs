//! FFmpeg subprocess encoding.
//!
//! Frames are piped to `ffmpeg` as raw RGBA. Audio, if any, is written to a
//! scratch `f32le` file passed as a second input. The container is written
//! to a scratch file and read back on finalize.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use image::RgbaImage;
use tempfile::TempDir;

use crate::media::{AudioBuffer, MediaError, MediaResult, MediaSink, OutputFormat, OutputSpec};

/// Lines of encoder stderr kept in error messages.
const STDERR_TAIL_LINES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Created,
    Started,
    Finalized,
    Cancelled,
}

/// [`MediaSink`] backed by an `ffmpeg` encoder process.
pub struct FfmpegSink {
    spec: OutputSpec,
    scratch: Option<TempDir>,
    audio: Option<AudioBuffer>,
    child: Option<Child>,
    stdin: Option<BufWriter<ChildStdin>>,
    state: SinkState,
    frames: u64,
}

impl FfmpegSink {
    /// Create a sink whose scratch files live under `temp_root`.
    pub fn new(spec: &OutputSpec, temp_root: Option<&Path>) -> MediaResult<Self> {
        if spec.width == 0 || spec.height == 0 || spec.fps == 0 {
            return Err(MediaError::encode("Output needs a non-zero size and frame rate"));
        }

        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("subburn-export-");
            b
        };
        let scratch = match temp_root {
            Some(root) => {
                fs::create_dir_all(root).map_err(|e| {
                    MediaError::encode(format!("Failed to create temp dir {}: {}", root.display(), e))
                })?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| MediaError::encode(format!("Failed to create scratch dir: {}", e)))?;

        Ok(Self {
            spec: *spec,
            scratch: Some(scratch),
            audio: None,
            child: None,
            stdin: None,
            state: SinkState::Created,
            frames: 0,
        })
    }

    fn scratch_path(&self, name: &str) -> MediaResult<PathBuf> {
        self.scratch
            .as_ref()
            .map(|dir| dir.path().join(name))
            .ok_or_else(|| MediaError::state("Sink scratch directory already released"))
    }

    fn output_path(&self) -> MediaResult<PathBuf> {
        self.scratch_path(&format!("output.{}", self.spec.format.extension()))
    }

    /// Last lines of the encoder log, for error messages.
    fn stderr_tail(&self) -> String {
        let Ok(path) = self.scratch_path("ffmpeg.log") else {
            return String::new();
        };
        let content = fs::read_to_string(path).unwrap_or_default();
        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
        lines[start..].join("\n")
    }

    fn build_command(&self, audio_path: Option<&Path>) -> MediaResult<Command> {
        let spec = &self.spec;
        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgba")
            .arg("-s:v")
            .arg(format!("{}x{}", spec.width, spec.height))
            .arg("-r")
            .arg(spec.fps.to_string())
            .arg("-i")
            .arg("-");

        if let (Some(path), Some(audio)) = (audio_path, self.audio.as_ref()) {
            cmd.arg("-f")
                .arg("f32le")
                .arg("-ar")
                .arg(audio.sample_rate.to_string())
                .arg("-ac")
                .arg(audio.channels.to_string())
                .arg("-i")
                .arg(path)
                .arg("-map")
                .arg("0:v")
                .arg("-map")
                .arg("1:a");
        } else {
            cmd.arg("-an");
        }

        let video_bitrate = spec.video_bitrate().to_string();
        let audio_bitrate = spec.audio_bitrate().to_string();
        match spec.format {
            OutputFormat::Mp4 => {
                cmd.arg("-c:v")
                    .arg("libx264")
                    .arg("-preset")
                    .arg("medium")
                    .arg("-b:v")
                    .arg(&video_bitrate)
                    .arg("-pix_fmt")
                    .arg("yuv420p")
                    .arg("-movflags")
                    .arg("+faststart");
                if audio_path.is_some() {
                    cmd.arg("-c:a").arg("aac").arg("-b:a").arg(&audio_bitrate);
                }
            }
            OutputFormat::WebM => {
                cmd.arg("-c:v")
                    .arg("libvpx-vp9")
                    .arg("-b:v")
                    .arg(&video_bitrate)
                    .arg("-pix_fmt")
                    .arg("yuv420p");
                if audio_path.is_some() {
                    cmd.arg("-c:a").arg("libopus").arg("-b:a").arg(&audio_bitrate);
                }
            }
        }

        let log = File::create(self.scratch_path("ffmpeg.log")?)
            .map_err(|e| MediaError::encode(format!("Failed to create encoder log: {}", e)))?;
        cmd.arg(self.output_path()?)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log));
        Ok(cmd)
    }

    fn kill_child(&mut self) {
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl MediaSink for FfmpegSink {
    fn add_audio(&mut self, audio: AudioBuffer) -> MediaResult<()> {
        if self.state != SinkState::Created {
            return Err(MediaError::state("Audio must be added before the sink starts"));
        }
        tracing::debug!(
            "[FFmpeg] Queued {:.2}s of audio ({} Hz, {} ch)",
            audio.duration(),
            audio.sample_rate,
            audio.channels
        );
        self.audio = Some(audio);
        Ok(())
    }

    fn start(&mut self) -> MediaResult<()> {
        if self.state != SinkState::Created {
            return Err(MediaError::state("Sink already started"));
        }

        let audio_path = match &self.audio {
            Some(audio) if !audio.is_empty() => {
                let path = self.scratch_path("audio.f32le")?;
                fs::write(&path, audio.to_le_bytes())
                    .map_err(|e| MediaError::encode(format!("Failed to stage audio: {}", e)))?;
                Some(path)
            }
            _ => None,
        };

        let mut cmd = self.build_command(audio_path.as_deref())?;
        tracing::debug!("[FFmpeg] Running: {:?}", cmd);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MediaError::ToolMissing("ffmpeg")
            } else {
                MediaError::encode(format!("Failed to spawn ffmpeg: {}", e))
            }
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MediaError::encode("Failed to open ffmpeg stdin"))?;

        self.child = Some(child);
        self.stdin = Some(BufWriter::new(stdin));
        self.state = SinkState::Started;
        tracing::info!(
            "[FFmpeg] Encoder started: {} {}x{} @ {} fps ({}/{})",
            self.spec.format,
            self.spec.width,
            self.spec.height,
            self.spec.fps,
            self.spec.format.video_codec(),
            self.spec.format.audio_codec()
        );
        Ok(())
    }

    fn add_frame(&mut self, frame: &RgbaImage, timestamp: f64, _duration: f64) -> MediaResult<()> {
        if self.state != SinkState::Started {
            return Err(MediaError::state("Sink is not accepting frames"));
        }
        if frame.dimensions() != (self.spec.width, self.spec.height) {
            return Err(MediaError::encode(format!(
                "Frame is {}x{}, encoder expects {}x{}",
                frame.width(),
                frame.height(),
                self.spec.width,
                self.spec.height
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MediaError::state("Encoder input already closed"))?;
        if let Err(e) = stdin.write_all(frame.as_raw()) {
            let tail = self.stderr_tail();
            return Err(MediaError::encode(format!(
                "Failed to write frame at {:.3}s: {}{}{}",
                timestamp,
                e,
                if tail.is_empty() { "" } else { "\n" },
                tail
            )));
        }
        self.frames += 1;
        Ok(())
    }

    fn finalize(&mut self) -> MediaResult<Vec<u8>> {
        if self.state != SinkState::Started {
            return Err(MediaError::state("Sink was not started"));
        }

        if let Some(mut stdin) = self.stdin.take() {
            stdin
                .flush()
                .map_err(|e| MediaError::finalize(format!("Failed to flush frames: {}", e)))?;
        }
        let mut child = self
            .child
            .take()
            .ok_or_else(|| MediaError::state("Encoder process missing"))?;
        let status = child
            .wait()
            .map_err(|e| MediaError::finalize(format!("ffmpeg process error: {}", e)))?;
        if !status.success() {
            return Err(MediaError::finalize(format!(
                "ffmpeg exited with code {:?}: {}",
                status.code(),
                self.stderr_tail()
            )));
        }

        let bytes = fs::read(self.output_path()?)
            .map_err(|e| MediaError::finalize(format!("Failed to read encoded output: {}", e)))?;
        if bytes.is_empty() {
            return Err(MediaError::finalize("Encoder produced an empty file"));
        }

        self.state = SinkState::Finalized;
        self.scratch = None;
        tracing::info!("[FFmpeg] Finalized {} frames, {} bytes", self.frames, bytes.len());
        Ok(bytes)
    }

    fn cancel(&mut self) {
        if matches!(self.state, SinkState::Finalized | SinkState::Cancelled) {
            return;
        }
        self.kill_child();
        self.state = SinkState::Cancelled;
        self.scratch = None;
        tracing::debug!("[FFmpeg] Encoder cancelled after {} frames", self.frames);
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::Quality;

    fn spec(format: OutputFormat) -> OutputSpec {
        OutputSpec {
            format,
            quality: Quality::High,
            fps: 30,
            width: 64,
            height: 36,
        }
    }

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn mp4_command_uses_h264_and_faststart() {
        let sink = FfmpegSink::new(&spec(OutputFormat::Mp4), None).unwrap();
        let args = args(&sink.build_command(None).unwrap());
        assert!(has_pair(&args, "-c:v", "libx264"));
        assert!(has_pair(&args, "-movflags", "+faststart"));
        assert!(args.contains(&"-an".to_string()));
        assert!(args.last().unwrap().ends_with("output.mp4"));
    }

    #[test]
    fn webm_command_with_audio_maps_both_inputs() {
        let mut sink = FfmpegSink::new(&spec(OutputFormat::WebM), None).unwrap();
        sink.add_audio(AudioBuffer::new(48_000, 2, vec![0.0; 96])).unwrap();
        let audio = sink.scratch_path("audio.f32le").unwrap();
        let args = args(&sink.build_command(Some(&audio)).unwrap());
        assert!(has_pair(&args, "-c:v", "libvpx-vp9"));
        assert!(has_pair(&args, "-c:a", "libopus"));
        assert!(has_pair(&args, "-map", "1:a"));
    }

    #[test]
    fn frames_rejected_before_start() {
        let mut sink = FfmpegSink::new(&spec(OutputFormat::Mp4), None).unwrap();
        let frame = RgbaImage::new(64, 36);
        assert!(matches!(
            sink.add_frame(&frame, 0.0, 1.0 / 30.0),
            Err(MediaError::State(_))
        ));
    }

    #[test]
    fn cancel_releases_scratch_dir() {
        let root = tempfile::tempdir().unwrap();
        let mut sink = FfmpegSink::new(&spec(OutputFormat::Mp4), Some(root.path())).unwrap();
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 1);
        sink.cancel();
        sink.cancel();
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
