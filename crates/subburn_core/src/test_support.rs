//! In-memory fakes shared by unit tests.
//!
//! `FixedWidthText` stands in for real fonts; `MockBackend` stands in for
//! ffmpeg and records everything the export loop does to it.

use std::path::Path;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;

use crate::export::CancelHandle;
use crate::layout::{FontSpec, TextMeasure};
use crate::media::{
    AudioBuffer, FrameCursor, MediaBackend, MediaError, MediaResult, MediaSink, MediaSource,
    OutputSpec, SourceInfo,
};
use crate::render::{GlyphMask, TextRaster};

/// Every character is half an em wide; glyphs rasterize as solid boxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedWidthText;

impl TextMeasure for FixedWidthText {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        text.chars().count() as f32 * font.size_px * 0.5
    }
}

impl TextRaster for FixedWidthText {
    fn rasterize(&self, text: &str, font: &FontSpec) -> GlyphMask {
        let width = self.measure(text, font).ceil() as u32;
        let height = font.size_px.ceil() as u32;
        if width == 0 || height == 0 {
            return GlyphMask::empty();
        }
        GlyphMask::new(
            width,
            height,
            vec![255; (width * height) as usize],
            width as f32 / 2.0,
            height as f32 / 2.0,
        )
    }
}

/// Colour of every decoded mock frame.
pub const SOURCE_PIXEL: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// What the export loop did to the mock backend.
#[derive(Debug, Default)]
pub struct MockRecord {
    pub frames: Vec<RgbaImage>,
    pub timestamps: Vec<f64>,
    pub durations: Vec<f64>,
    pub requested_times: Vec<f64>,
    pub audio: Option<AudioBuffer>,
    pub sink_spec: Option<OutputSpec>,
    pub started: bool,
    pub finalized: bool,
    pub cancelled: bool,
    pub cursor_closed: bool,
}

/// Scriptable [`MediaBackend`].
#[derive(Clone)]
pub struct MockBackend {
    pub info: SourceInfo,
    pub audio: Option<AudioBuffer>,
    /// Frame size the cursor produces, independent of the requested size.
    pub decode_size: Option<(u32, u32)>,
    pub fail_open: bool,
    pub fail_frame_at: Option<usize>,
    pub fail_add_frame_at: Option<usize>,
    pub fail_finalize: bool,
    /// Raise the flag once this many frames have been encoded.
    pub cancel_after: Option<(usize, CancelHandle)>,
    pub record: Arc<Mutex<MockRecord>>,
}

impl MockBackend {
    pub fn new(duration: f64, width: u32, height: u32) -> Self {
        Self {
            info: SourceInfo {
                duration,
                width,
                height,
                fps: Some(30.0),
                has_video: true,
                has_audio: true,
            },
            audio: Some(AudioBuffer::new(48_000, 2, vec![0.0; 96])),
            decode_size: None,
            fail_open: false,
            fail_frame_at: None,
            fail_add_frame_at: None,
            fail_finalize: false,
            cancel_after: None,
            record: Arc::new(Mutex::new(MockRecord::default())),
        }
    }
}

impl MediaBackend for MockBackend {
    fn open(&self, path: &Path) -> MediaResult<Box<dyn MediaSource>> {
        if self.fail_open {
            return Err(MediaError::open(path, "mock open failure"));
        }
        Ok(Box::new(MockSource {
            backend: self.clone(),
        }))
    }

    fn create_sink(&self, spec: &OutputSpec) -> MediaResult<Box<dyn MediaSink>> {
        self.record.lock().sink_spec = Some(*spec);
        Ok(Box::new(MockSink {
            backend: self.clone(),
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockSource {
    backend: MockBackend,
}

impl MediaSource for MockSource {
    fn info(&self) -> &SourceInfo {
        &self.backend.info
    }

    fn frame_cursor(&self, width: u32, height: u32, _fps: u32) -> Option<Box<dyn FrameCursor>> {
        if !self.backend.info.has_video {
            return None;
        }
        let (width, height) = self.backend.decode_size.unwrap_or((width, height));
        Some(Box::new(MockCursor {
            backend: self.backend.clone(),
            width,
            height,
            calls: 0,
            last_time: None,
        }))
    }

    fn decode_audio(&self) -> Option<AudioBuffer> {
        self.backend.audio.clone()
    }
}

struct MockCursor {
    backend: MockBackend,
    width: u32,
    height: u32,
    calls: usize,
    last_time: Option<f64>,
}

impl FrameCursor for MockCursor {
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
        self.backend.record.lock().requested_times.push(time);

        let index = self.calls;
        self.calls += 1;
        if self.backend.fail_frame_at == Some(index) {
            return Err(MediaError::decode("mock frame failure"));
        }
        Ok(Some(RgbaImage::from_pixel(self.width, self.height, SOURCE_PIXEL)))
    }

    fn close(&mut self) {
        self.backend.record.lock().cursor_closed = true;
    }
}

struct MockSink {
    backend: MockBackend,
}

impl MediaSink for MockSink {
    fn add_audio(&mut self, audio: AudioBuffer) -> MediaResult<()> {
        self.backend.record.lock().audio = Some(audio);
        Ok(())
    }

    fn start(&mut self) -> MediaResult<()> {
        self.backend.record.lock().started = true;
        Ok(())
    }

    fn add_frame(&mut self, frame: &RgbaImage, timestamp: f64, duration: f64) -> MediaResult<()> {
        let count = {
            let mut record = self.backend.record.lock();
            if self.backend.fail_add_frame_at == Some(record.frames.len()) {
                return Err(MediaError::encode("mock encoder failure"));
            }
            record.frames.push(frame.clone());
            record.timestamps.push(timestamp);
            record.durations.push(duration);
            record.frames.len()
        };
        if let Some((after, handle)) = &self.backend.cancel_after {
            if count >= *after {
                handle.cancel();
            }
        }
        Ok(())
    }

    fn finalize(&mut self) -> MediaResult<Vec<u8>> {
        if self.backend.fail_finalize {
            return Err(MediaError::finalize("mock muxer failure"));
        }
        let mut record = self.backend.record.lock();
        record.finalized = true;
        Ok(vec![0x42; record.frames.len().max(1)])
    }

    fn cancel(&mut self) {
        self.backend.record.lock().cancelled = true;
    }
}

/// True if any pixel of `frame` differs from the decoded source colour.
pub fn has_overlay(frame: &RgbaImage) -> bool {
    frame.pixels().any(|p| *p != SOURCE_PIXEL)
}
