//! The mutable export job record and its cancellation handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::media::{FrameCursor, MediaError, MediaResult, MediaSink};

use super::types::ExportPhase;

/// Handle for cancelling a running export.
///
/// Cancellation is cooperative: the render loop checks the flag before
/// decoding a frame and again before encoding it.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// State of one export: flag, live codec handles, progress and status.
///
/// The cursor and sink are owned here rather than by the render loop so
/// that every exit path can release them through [`ExportJob::release`],
/// which also runs on drop.
pub struct ExportJob {
    cancel: CancelHandle,
    cursor: Option<Box<dyn FrameCursor>>,
    sink: Option<Box<dyn MediaSink>>,
    phase: ExportPhase,
    progress: f32,
    status: String,
}

impl ExportJob {
    pub fn new() -> Self {
        Self {
            cancel: CancelHandle::new(),
            cursor: None,
            sink: None,
            phase: ExportPhase::Idle,
            progress: 0.0,
            status: String::new(),
        }
    }

    /// A clone of the job's cancellation handle.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase
    }

    /// Percent complete, 0 to 100.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// True while a cursor or sink is still held.
    pub fn holds_handles(&self) -> bool {
        self.cursor.is_some() || self.sink.is_some()
    }

    pub(crate) fn update(&mut self, phase: ExportPhase, progress: f32, status: impl Into<String>) {
        self.phase = phase;
        self.progress = progress.clamp(0.0, 100.0);
        self.status = status.into();
    }

    pub(crate) fn attach_cursor(&mut self, cursor: Box<dyn FrameCursor>) {
        self.close_cursor();
        self.cursor = Some(cursor);
    }

    pub(crate) fn attach_sink(&mut self, sink: Box<dyn MediaSink>) {
        self.cancel_sink();
        self.sink = Some(sink);
    }

    pub(crate) fn cursor_mut(&mut self) -> Option<&mut (dyn FrameCursor + 'static)> {
        self.cursor.as_deref_mut()
    }

    pub(crate) fn sink_mut(&mut self) -> MediaResult<&mut (dyn MediaSink + 'static)> {
        self.sink
            .as_deref_mut()
            .ok_or_else(|| MediaError::state("No encoder attached to the job"))
    }

    pub(crate) fn close_cursor(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
        }
    }

    /// Abort the encoder and drop its partial output.
    pub(crate) fn cancel_sink(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            sink.cancel();
        }
    }

    /// Finalize the encoder. On failure the sink stays attached so that
    /// [`ExportJob::release`] aborts it.
    pub(crate) fn finalize_sink(&mut self) -> MediaResult<Vec<u8>> {
        let bytes = self.sink_mut()?.finalize()?;
        self.sink = None;
        Ok(bytes)
    }

    /// Close the cursor and cancel a sink that was never finalized.
    pub fn release(&mut self) {
        if self.holds_handles() {
            tracing::debug!("[Export] Releasing codec handles");
        }
        self.close_cursor();
        self.cancel_sink();
    }
}

impl Default for ExportJob {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ExportJob {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaBackend, OutputFormat, OutputSpec, Quality};
    use crate::test_support::MockBackend;
    use std::path::Path;

    fn spec() -> OutputSpec {
        OutputSpec {
            format: OutputFormat::Mp4,
            quality: Quality::Low,
            fps: 30,
            width: 32,
            height: 18,
        }
    }

    #[test]
    fn cancel_handle_is_shared() {
        let job = ExportJob::new();
        let handle = job.cancel_handle();
        assert!(!job.is_cancelled());
        handle.cancel();
        assert!(job.is_cancelled());
    }

    #[test]
    fn drop_releases_cursor_and_cancels_sink() {
        let backend = MockBackend::new(1.0, 32, 18);
        let source = backend.open(Path::new("clip.mp4")).unwrap();
        {
            let mut job = ExportJob::new();
            job.attach_cursor(source.frame_cursor(32, 18, 30).unwrap());
            job.attach_sink(backend.create_sink(&spec()).unwrap());
            assert!(job.holds_handles());
        }
        let record = backend.record.lock();
        assert!(record.cursor_closed);
        assert!(record.cancelled);
    }

    #[test]
    fn finalized_sink_is_not_cancelled_on_release() {
        let backend = MockBackend::new(1.0, 32, 18);
        let mut job = ExportJob::new();
        job.attach_sink(backend.create_sink(&spec()).unwrap());

        let bytes = job.finalize_sink().unwrap();
        assert!(!bytes.is_empty());
        job.release();

        let record = backend.record.lock();
        assert!(record.finalized);
        assert!(!record.cancelled);
    }

    #[test]
    fn failed_finalize_keeps_sink_for_cleanup() {
        let mut backend = MockBackend::new(1.0, 32, 18);
        backend.fail_finalize = true;
        let mut job = ExportJob::new();
        job.attach_sink(backend.create_sink(&spec()).unwrap());

        assert!(job.finalize_sink().is_err());
        assert!(job.holds_handles());
        job.release();
        assert!(backend.record.lock().cancelled);
    }

    #[test]
    fn progress_is_clamped() {
        let mut job = ExportJob::new();
        job.update(ExportPhase::Rendering, 140.0, "Rendering");
        assert_eq!(job.progress(), 100.0);
        assert_eq!(job.status(), "Rendering");
    }
}
