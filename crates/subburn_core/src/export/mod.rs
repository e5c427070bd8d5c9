//! Caption burn-in export.
//!
//! An [`Exporter`] decodes the source frame by frame, composites the active
//! caption onto each frame and feeds the result to an encoder sink.
//!
//! # Phases
//!
//! ```text
//! Idle → Initializing → DecodingSetup → Rendering → Finalizing
//!                                                      ├── Complete
//!                                                      ├── Cancelled
//!                                                      └── Failed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use subburn_core::export::{ExportContext, ExportJob, ExportRequest, Exporter};
//!
//! let exporter = Exporter::with_fonts(backend, &fonts_dir, "Open Sans")?;
//! let ctx = ExportContext::new(ExportRequest::new(video, transcript), "clip", logger);
//! let mut job = ExportJob::new();
//! let cancel = job.cancel_handle(); // hand to another thread
//!
//! match exporter.run(&ctx, &mut job)? {
//!     ExportOutcome::Complete(artifact) => artifact.write_to(&output_dir)?,
//!     ExportOutcome::Cancelled => return Ok(()),
//! };
//! ```

mod error;
mod exporter;
mod job;
mod types;

pub use error::{ExportError, ExportResult};
pub use exporter::Exporter;
pub use job::{CancelHandle, ExportJob};
pub use types::{
    artifact_file_name, ExportArtifact, ExportContext, ExportOutcome, ExportPhase, ExportRequest,
    ProgressCallback, DEFAULT_FPS, FALLBACK_SIZE,
};
