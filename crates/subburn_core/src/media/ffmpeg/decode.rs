//! FFmpeg subprocess decoding: streaming RGBA frames and whole-track audio.

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use image::RgbaImage;

use crate::media::{AudioBuffer, FrameCursor, MediaError, MediaResult, MediaSource, SourceInfo};

use super::probe::probe_source;

/// Audio decode format handed to the encoder.
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;
pub const AUDIO_CHANNELS: u16 = 2;

/// A source video opened through ffprobe.
#[derive(Debug)]
pub struct FfmpegSource {
    path: PathBuf,
    info: SourceInfo,
}

impl FfmpegSource {
    pub fn open(path: &Path) -> MediaResult<Self> {
        if !path.exists() {
            return Err(MediaError::open(path, "File does not exist"));
        }
        let info = probe_source(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            info,
        })
    }
}

impl MediaSource for FfmpegSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn frame_cursor(&self, width: u32, height: u32, fps: u32) -> Option<Box<dyn FrameCursor>> {
        if !self.info.has_video {
            return None;
        }
        match FfmpegFrameCursor::spawn(&self.path, width, height, fps) {
            Ok(cursor) => Some(Box::new(cursor)),
            Err(e) => {
                tracing::warn!("[FFmpeg] Video decode unavailable: {}", e);
                None
            }
        }
    }

    fn decode_audio(&self) -> Option<AudioBuffer> {
        if !self.info.has_audio {
            return None;
        }
        match decode_audio_track(&self.path, AUDIO_SAMPLE_RATE, AUDIO_CHANNELS) {
            Ok(buffer) => Some(buffer),
            Err(e) => {
                tracing::warn!("[FFmpeg] Audio decode failed: {}", e);
                None
            }
        }
    }
}

/// Decode the primary audio track to interleaved `f32` samples.
pub fn decode_audio_track(path: &Path, sample_rate: u32, channels: u16) -> MediaResult<AudioBuffer> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(path)
        .arg("-vn")
        .arg("-ac")
        .arg(channels.to_string())
        .arg("-ar")
        .arg(sample_rate.to_string())
        .arg("-f")
        .arg("f32le")
        .arg("pipe:1");
    cmd.stderr(Stdio::null()).stdout(Stdio::piped());

    tracing::debug!("[FFmpeg] Running: {:?}", cmd);

    let mut child = cmd
        .spawn()
        .map_err(|e| MediaError::decode(format!("Failed to spawn ffmpeg: {}", e)))?;
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| MediaError::decode("Failed to capture ffmpeg stdout"))?;

    let mut buffer = Vec::new();
    stdout
        .read_to_end(&mut buffer)
        .map_err(|e| MediaError::decode(format!("Failed to read ffmpeg output: {}", e)))?;

    let status = child
        .wait()
        .map_err(|e| MediaError::decode(format!("ffmpeg process error: {}", e)))?;
    if !status.success() {
        return Err(MediaError::decode(format!(
            "ffmpeg exited with code: {:?}",
            status.code()
        )));
    }

    let audio = AudioBuffer::from_le_bytes(sample_rate, channels, &buffer);
    if audio.is_empty() {
        return Err(MediaError::decode("No audio samples decoded"));
    }

    tracing::debug!(
        "[FFmpeg] Decoded {:.2}s of audio from {}",
        audio.duration(),
        path.display()
    );
    Ok(audio)
}

/// Streams frames from one `ffmpeg` process resampled to a fixed rate.
///
/// Frame `k` of the stream is the picture shown at `k / fps`; requests in
/// between return the most recent frame.
pub struct FfmpegFrameCursor {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    width: u32,
    height: u32,
    fps: u32,
    /// Index of the next frame to read from the pipe.
    next_index: u64,
    current: Option<RgbaImage>,
    last_time: Option<f64>,
    finished: bool,
}

impl FfmpegFrameCursor {
    pub fn spawn(path: &Path, width: u32, height: u32, fps: u32) -> MediaResult<Self> {
        if width == 0 || height == 0 || fps == 0 {
            return Err(MediaError::decode("Frame cursor needs a non-zero size and rate"));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(path)
            .arg("-an")
            .arg("-vf")
            .arg(format!("fps={},scale={}:{}", fps, width, height))
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgba")
            .arg("pipe:1");
        cmd.stdin(Stdio::null())
            .stderr(Stdio::null())
            .stdout(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| MediaError::decode(format!("Failed to spawn ffmpeg: {}", e)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::decode("Failed to capture ffmpeg stdout"))?;

        tracing::debug!(
            "[FFmpeg] Frame cursor started: {}x{} @ {} fps",
            width,
            height,
            fps
        );

        Ok(Self {
            child: Some(child),
            stdout: Some(stdout),
            width,
            height,
            fps,
            next_index: 0,
            current: None,
            last_time: None,
            finished: false,
        })
    }

    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Read the next frame from the pipe, `None` at end of stream.
    fn read_frame(&mut self) -> MediaResult<Option<RgbaImage>> {
        let len = self.frame_len();
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; len];
        match stdout.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(MediaError::decode(format!("Failed to read frame: {}", e))),
        }

        self.next_index += 1;
        RgbaImage::from_raw(self.width, self.height, buf)
            .map(Some)
            .ok_or_else(|| MediaError::decode("Frame buffer size mismatch"))
    }
}

impl FrameCursor for FfmpegFrameCursor {
    fn next_at(&mut self, time: f64) -> MediaResult<Option<RgbaImage>> {
        if let Some(previous) = self.last_time {
            if time < previous {
                return Err(MediaError::Backwards {
                    requested: time,
                    previous,
                });
            }
        }
        self.last_time = Some(time);

        if self.finished {
            return Ok(None);
        }

        let target = (time.max(0.0) * self.fps as f64 + 1e-6).floor() as u64;
        while self.next_index <= target {
            match self.read_frame()? {
                Some(frame) => self.current = Some(frame),
                None => {
                    tracing::debug!("[FFmpeg] Frame stream ended after {} frames", self.next_index);
                    self.finished = true;
                    self.close();
                    return Ok(None);
                }
            }
        }

        Ok(self.current.clone())
    }

    fn close(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for FfmpegFrameCursor {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_nonexistent_fails() {
        let result = FfmpegSource::open(Path::new("/nonexistent/video.mp4"));
        assert!(matches!(result, Err(MediaError::Open { .. })));
    }

    #[test]
    fn cursor_rejects_zero_size() {
        let result = FfmpegFrameCursor::spawn(Path::new("/nonexistent/video.mp4"), 0, 10, 30);
        assert!(result.is_err());
    }
}
