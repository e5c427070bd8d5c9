//! Transcript model and chunk processing.
//!
//! # Components
//!
//! - **types**: chunks, display units, modes and the phrase grouping policy
//! - **processor**: word/phrase display unit construction
//! - **edit**: user edits (text replacement, disable toggle, insertion)
//! - **timeline**: the enabled units queried by the render loop

mod edit;
mod error;
mod processor;
mod timeline;
mod types;

use std::fs;
use std::path::Path;

pub use edit::parse_time_input;
pub use error::TranscriptError;
pub use processor::process;
pub use timeline::ChunkTimeline;
pub use types::{
    DisplayMode, PhraseGrouping, ProcessedChunk, TimeRange, Transcript, TranscriptChunk, Word,
};

/// Load a transcript JSON file (`{ "text": ..., "chunks": [...] }`).
///
/// Chunks are re-sorted by start time so later stages can rely on ordering.
pub fn load_transcript(path: impl AsRef<Path>) -> Result<Transcript, TranscriptError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| TranscriptError::Load(format!("{}: {}", path.display(), e)))?;
    let mut transcript: Transcript = serde_json::from_str(&content)
        .map_err(|e| TranscriptError::Load(format!("{}: {}", path.display(), e)))?;

    transcript
        .chunks
        .sort_by(|a, b| a.timestamp.start.total_cmp(&b.timestamp.start));
    if transcript.text.is_empty() {
        transcript.refresh_text();
    }

    tracing::info!(
        "Loaded transcript '{}' with {} chunks",
        path.display(),
        transcript.chunks.len()
    );
    Ok(transcript)
}
