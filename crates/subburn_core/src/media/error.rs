//! Media error types.

use std::path::PathBuf;

/// Errors raised by media backends.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Source could not be opened.
    #[error("Failed to open {path}: {message}")]
    Open { path: PathBuf, message: String },

    /// Probing the source failed.
    #[error("Failed to probe source: {0}")]
    Probe(String),

    /// Decoding a frame or the audio track failed.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// A frame was requested earlier than the previous one.
    #[error("Frame cursor cannot seek backwards ({requested:.3}s < {previous:.3}s)")]
    Backwards { requested: f64, previous: f64 },

    /// Encoder setup or frame submission failed.
    #[error("Encode failed: {0}")]
    Encode(String),

    /// Finalizing the output container failed.
    #[error("Finalize failed: {0}")]
    Finalize(String),

    /// Operation not valid in the handle's current state.
    #[error("Invalid state: {0}")]
    State(String),

    /// Required external tool missing.
    #[error("{0} not found on PATH")]
    ToolMissing(&'static str),
}

impl MediaError {
    pub fn open(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    pub fn finalize(message: impl Into<String>) -> Self {
        Self::Finalize(message.into())
    }

    pub fn state(message: impl Into<String>) -> Self {
        Self::State(message.into())
    }
}

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;
