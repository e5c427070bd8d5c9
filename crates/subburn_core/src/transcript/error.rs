//! Transcript error types.

/// Errors raised by transcript edits and loading.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    /// A display index did not map to a unit for the current mode.
    #[error("No display unit at index {index} ({len} available)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Start must come strictly before end.
    #[error("Invalid time range: start {start:.3}s must be before end {end:.3}s")]
    InvalidRange { start: f64, end: f64 },

    /// New chunks need some text.
    #[error("Chunk text must not be empty")]
    EmptyText,

    /// Failed to read or decode a transcript file.
    #[error("Failed to load transcript: {0}")]
    Load(String),
}

impl TranscriptError {
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}
