//! Media decode/encode boundary.
//!
//! The export pipeline only sees the traits in this module. The FFmpeg
//! backend implements them with `ffprobe`/`ffmpeg` subprocesses.
//!
//! # Usage
//!
//! ```ignore
//! use subburn_core::media::{ffmpeg::FfmpegBackend, MediaBackend};
//!
//! let backend = FfmpegBackend::new(temp_dir);
//! let source = backend.open(path)?;
//! let mut cursor = source.frame_cursor(1920, 1080, 30);
//! ```

mod error;
pub mod ffmpeg;
mod types;

use std::path::Path;

use image::RgbaImage;

pub use error::{MediaError, MediaResult};
pub use types::{AudioBuffer, OutputFormat, OutputSpec, Quality, SourceInfo};

/// Factory for sources and sinks.
pub trait MediaBackend: Send + Sync {
    /// Open a source video for decoding.
    fn open(&self, path: &Path) -> MediaResult<Box<dyn MediaSource>>;

    /// Create an encoder sink for the given output.
    fn create_sink(&self, spec: &OutputSpec) -> MediaResult<Box<dyn MediaSink>>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}

/// An opened source video.
pub trait MediaSource: Send {
    fn info(&self) -> &SourceInfo;

    /// Start a decode cursor producing frames scaled to `width`x`height`.
    ///
    /// `None` when the source has no decodable video track.
    fn frame_cursor(&self, width: u32, height: u32, fps: u32) -> Option<Box<dyn FrameCursor>>;

    /// Decode the whole primary audio track, `None` if absent or undecodable.
    fn decode_audio(&self) -> Option<AudioBuffer>;
}

/// Pull-based frame decoder over ascending timestamps.
///
/// Finite and not restartable: once it returns `Ok(None)` every later call
/// does too.
pub trait FrameCursor: Send {
    /// Frame shown at `time` seconds.
    ///
    /// Requesting a time earlier than the previous request is an error.
    fn next_at(&mut self, time: f64) -> MediaResult<Option<RgbaImage>>;

    /// Stop decoding and release the decoder. Idempotent.
    fn close(&mut self);
}

/// Encoder target buffering the output container.
pub trait MediaSink: Send {
    /// Queue the audio track; must be called before [`MediaSink::start`].
    fn add_audio(&mut self, audio: AudioBuffer) -> MediaResult<()>;

    fn start(&mut self) -> MediaResult<()>;

    /// Encode one frame presented at `timestamp` for `duration` seconds.
    fn add_frame(&mut self, frame: &RgbaImage, timestamp: f64, duration: f64) -> MediaResult<()>;

    /// Close the container and return its bytes.
    fn finalize(&mut self) -> MediaResult<Vec<u8>>;

    /// Abort encoding and discard output. Idempotent.
    fn cancel(&mut self);
}
