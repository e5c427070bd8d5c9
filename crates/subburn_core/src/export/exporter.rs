//! The render loop that burns captions into a video.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::layout::plan_caption;
use crate::media::{MediaBackend, MediaError, OutputSpec};
use crate::render::{FontLibrary, FontdueText, FrameRenderer, TextRaster};
use crate::transcript::ChunkTimeline;

use super::error::{ExportError, ExportResult};
use super::job::ExportJob;
use super::types::{ExportArtifact, ExportContext, ExportOutcome, ExportPhase};

/// Progress is reported on every this-many frames, plus the last one.
const PROGRESS_EVERY: u64 = 3;

/// Colour of the surface before the first frame decodes.
const BLANK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Drives export jobs against a media backend and a text rasterizer.
///
/// One exporter runs at most one job at a time; a concurrent
/// [`Exporter::run`] fails with [`ExportError::Busy`].
pub struct Exporter {
    backend: Arc<dyn MediaBackend>,
    text: Arc<dyn TextRaster + Send + Sync>,
    busy: AtomicBool,
}

impl Exporter {
    pub fn new(backend: Arc<dyn MediaBackend>, text: Arc<dyn TextRaster + Send + Sync>) -> Self {
        Self {
            backend,
            text,
            busy: AtomicBool::new(false),
        }
    }

    /// Exporter rendering with the fonts found in `fonts_dir`.
    pub fn with_fonts(
        backend: Arc<dyn MediaBackend>,
        fonts_dir: &Path,
        fallback_family: &str,
    ) -> ExportResult<Self> {
        let library = FontLibrary::load_dir(fonts_dir)?.with_fallback(fallback_family);
        Ok(Self::new(backend, Arc::new(FontdueText::new(library))))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Run one export to a terminal state.
    ///
    /// Cancellation is not an error: it yields [`ExportOutcome::Cancelled`].
    /// Handles held by `job` are released on every exit path.
    pub fn run(&self, ctx: &ExportContext, job: &mut ExportJob) -> ExportResult<ExportOutcome> {
        let _guard = BusyGuard::acquire(&self.busy).ok_or(ExportError::Busy)?;

        ctx.logger.phase(&format!("Export '{}'", ctx.job_name));
        tracing::info!("[Export] Starting '{}' via {}", ctx.job_name, self.backend.name());

        let result = self.drive(ctx, job);
        job.release();

        match result {
            Ok(Some(artifact)) => {
                report(ctx, job, ExportPhase::Complete, 100.0, "Export complete!");
                ctx.logger.success(&format!(
                    "Export complete: {} ({} bytes)",
                    artifact.file_name,
                    artifact.bytes.len()
                ));
                Ok(ExportOutcome::Complete(artifact))
            }
            Ok(None) => {
                report(ctx, job, ExportPhase::Cancelled, 0.0, "Download cancelled");
                ctx.logger.warn("Export cancelled by user");
                Ok(ExportOutcome::Cancelled)
            }
            Err(e) => {
                let progress = job.progress();
                report(ctx, job, ExportPhase::Failed, progress, &format!("Error: {}", e));
                ctx.logger.error(&e.to_string());
                for line in e.diagnostics() {
                    ctx.logger.output_line(&line, true);
                }
                ctx.logger.show_tail("encoder");
                Err(e)
            }
        }
    }

    /// Everything up to the terminal state; `Ok(None)` means cancelled.
    fn drive(&self, ctx: &ExportContext, job: &mut ExportJob) -> ExportResult<Option<ExportArtifact>> {
        let request = &ctx.request;

        report(ctx, job, ExportPhase::Initializing, 0.0, "Initializing export...");
        let source_path = request
            .source
            .as_deref()
            .ok_or_else(|| ExportError::input_missing("no source video selected"))?;
        if request.transcript.is_empty() {
            return Err(ExportError::input_missing("transcript has no chunks"));
        }
        if request.fps == 0 {
            return Err(ExportError::input_missing("frame rate must be positive"));
        }
        let timeline = ChunkTimeline::build(&request.transcript, request.mode, &request.grouping);
        ctx.logger.info(&format!(
            "{} caption units ({} mode), {} fps, {} / {}",
            timeline.len(),
            request.mode,
            request.fps,
            request.format,
            request.quality
        ));

        report(ctx, job, ExportPhase::DecodingSetup, 0.0, "Reading original video...");
        let source = self.backend.open(source_path).map_err(ExportError::Source)?;
        let info = source.info().clone();
        if !(info.duration.is_finite() && info.duration > 0.0) {
            return Err(ExportError::Source(MediaError::Probe(
                "source has no usable duration".to_string(),
            )));
        }
        let spec = request.output_spec(&info);
        ctx.logger.info(&format!(
            "Source {:.2}s, output {}x{} @ {} fps",
            info.duration, spec.width, spec.height, spec.fps
        ));

        job.attach_sink(self.backend.create_sink(&spec).map_err(ExportError::Encode)?);

        report(ctx, job, ExportPhase::DecodingSetup, 0.0, "Processing audio...");
        match source.decode_audio() {
            Some(audio) => {
                let seconds = audio.duration();
                match job.sink_mut().and_then(|sink| sink.add_audio(audio)) {
                    Ok(()) => ctx.logger.info(&format!("Audio track queued ({:.2}s)", seconds)),
                    Err(e) => ctx
                        .logger
                        .warn(&format!("Audio could not be encoded, exporting video only: {}", e)),
                }
            }
            None if info.has_audio => ctx
                .logger
                .warn("Audio track could not be decoded, exporting video only"),
            None => ctx.logger.info("Source has no audio track"),
        }

        job.sink_mut()
            .and_then(|sink| sink.start())
            .map_err(ExportError::Encode)?;

        match source.frame_cursor(spec.width, spec.height, spec.fps) {
            Some(cursor) => job.attach_cursor(cursor),
            None => ctx
                .logger
                .warn("No decodable video track, captions render over a blank frame"),
        }

        let completed = self.render_frames(ctx, job, &timeline, &spec, info.duration)?;

        if !completed {
            let progress = job.progress();
            report(ctx, job, ExportPhase::Finalizing, progress, "Cancelling download...");
            job.close_cursor();
            job.cancel_sink();
            return Ok(None);
        }

        let progress = job.progress();
        report(ctx, job, ExportPhase::Finalizing, progress, "Finalizing video...");
        job.close_cursor();
        let bytes = job.finalize_sink().map_err(ExportError::Finalize)?;

        Ok(Some(ExportArtifact::new(bytes, request.format, Utc::now())))
    }

    /// The per-frame loop. Returns `false` if cancellation stopped it.
    fn render_frames(
        &self,
        ctx: &ExportContext,
        job: &mut ExportJob,
        timeline: &ChunkTimeline,
        spec: &OutputSpec,
        duration: f64,
    ) -> ExportResult<bool> {
        let request = &ctx.request;
        let fps = spec.fps as f64;
        let total = ((duration * fps).ceil() as u64).max(1);
        let frame_duration = 1.0 / fps;
        let renderer = FrameRenderer::new(&*self.text);
        let mut surface = RgbaImage::from_pixel(spec.width, spec.height, BLANK);
        let mut skipped = 0u64;

        report(ctx, job, ExportPhase::Rendering, 0.0, "Rendering video frames...");
        ctx.logger.section(&format!("Rendering {} frames", total));

        for f in 0..total {
            if job.is_cancelled() {
                ctx.logger.info(&format!("Cancelled before frame {}", f));
                return Ok(false);
            }

            let time = f as f64 / fps;

            if let Some(cursor) = job.cursor_mut() {
                match cursor.next_at(time) {
                    Ok(Some(frame)) => {
                        surface = if frame.dimensions() == (spec.width, spec.height) {
                            frame
                        } else {
                            imageops::resize(&frame, spec.width, spec.height, FilterType::Triangle)
                        };
                    }
                    Ok(None) => {}
                    Err(e) => {
                        skipped += 1;
                        tracing::debug!("[Export] Frame {} at {:.3}s skipped: {}", f, time, e);
                    }
                }
            }

            let mut composed = surface.clone();
            if let Some(unit) = timeline.active_at(time) {
                let plan = plan_caption(
                    unit,
                    &request.style,
                    (spec.width, spec.height),
                    request.mode,
                    time,
                    renderer.text(),
                );
                renderer.draw(&mut composed, &plan);
            }

            if job.is_cancelled() {
                ctx.logger.info(&format!("Cancelled before encoding frame {}", f));
                return Ok(false);
            }

            job.sink_mut()
                .and_then(|sink| sink.add_frame(&composed, time, frame_duration))
                .map_err(ExportError::Encode)?;

            if f % PROGRESS_EVERY == 0 || f + 1 == total {
                let percent = (f as f64 / total as f64 * 100.0) as f32;
                let status = format!(
                    "Rendering: {}s / {}s ({}%)",
                    time.round(),
                    duration.round(),
                    percent.round()
                );
                report(ctx, job, ExportPhase::Rendering, percent, &status);
                ctx.logger.progress(percent as u32);
            }
        }

        if skipped > 0 {
            ctx.logger
                .warn(&format!("{} of {} frames could not be decoded", skipped, total));
        }
        Ok(true)
    }
}

fn report(ctx: &ExportContext, job: &mut ExportJob, phase: ExportPhase, percent: f32, status: &str) {
    job.update(phase, percent, status);
    ctx.report_progress(phase, job.progress(), status);
}

/// Holds the exporter's busy flag for the duration of a run.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
