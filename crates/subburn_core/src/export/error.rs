//! Error types for the export orchestrator.
//!
//! Only failures that stop the job surface here. A frame that fails to
//! decode is skipped and an audio track that fails to decode degrades the
//! export to video-only; neither becomes an `ExportError`.

use thiserror::Error;

use crate::media::MediaError;
use crate::render::FontError;

/// Fatal export failure.
#[derive(Error, Debug)]
pub enum ExportError {
    /// No source video, or nothing to caption.
    #[error("Missing input: {0}")]
    InputMissing(String),

    /// Another export is already running on this exporter.
    #[error("An export is already in progress")]
    Busy,

    /// The source could not be opened or probed.
    #[error("Could not read source video: {0}")]
    Source(#[source] MediaError),

    /// No usable font for captions.
    #[error(transparent)]
    Font(#[from] FontError),

    /// Encoder setup or frame submission failed.
    #[error("Encoding failed: {0}")]
    Encode(#[source] MediaError),

    /// The output container could not be finalized.
    #[error("Finalizing failed: {0}")]
    Finalize(#[source] MediaError),
}

impl ExportError {
    pub fn input_missing(message: impl Into<String>) -> Self {
        Self::InputMissing(message.into())
    }

    /// Codec diagnostics carried by the underlying media error, if any.
    pub fn diagnostics(&self) -> Vec<String> {
        let message = match self {
            Self::Encode(e) | Self::Finalize(e) => e.to_string(),
            _ => return Vec::new(),
        };
        message.lines().skip(1).map(str::to_owned).collect()
    }
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
