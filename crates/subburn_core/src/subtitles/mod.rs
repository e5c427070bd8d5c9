//! Subtitle file export and import.
//!
//! # Components
//!
//! - **types**: formats and parsed cues
//! - **writers**: transcript → SRT / WebVTT / JSON text
//! - **parsers**: SRT / WebVTT text → cues
//!
//! # Usage
//!
//! ```ignore
//! use subburn_core::subtitles::{export_file, import_file};
//!
//! export_file(&transcript, "captions.srt", DisplayMode::Phrase, &grouping)?;
//! let transcript = import_file("captions.vtt")?;
//! ```

mod error;
pub mod parsers;
mod types;
pub mod writers;

use std::fs;
use std::path::Path;

use crate::transcript::{DisplayMode, PhraseGrouping, Transcript, TranscriptChunk};

pub use error::{ParseError, SubtitleError};
pub use parsers::{parse_content, parse_srt, parse_srt_time, parse_vtt, parse_vtt_time};
pub use types::{SubtitleCue, SubtitleFormat};
pub use writers::{
    display_cues, format_srt_time, format_vtt_time, to_json, to_srt, to_vtt, write_content,
    write_srt, write_vtt,
};

/// Parse a cue file from disk.
///
/// Detects format from the file extension, falling back to content.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<SubtitleCue>, SubtitleError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| SubtitleError::read(path, e))?;
    Ok(parse_content(&content, SubtitleFormat::from_extension(path))?)
}

/// Write text content to a file.
pub fn write_file(path: impl AsRef<Path>, content: &str) -> Result<(), SubtitleError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SubtitleError::write(path, e))?;
    }
    fs::write(path, content).map_err(|e| SubtitleError::write(path, e))
}

/// Export a transcript to `path`, choosing the format by extension.
pub fn export_file(
    transcript: &Transcript,
    path: impl AsRef<Path>,
    mode: DisplayMode,
    grouping: &PhraseGrouping,
) -> Result<SubtitleFormat, SubtitleError> {
    let path = path.as_ref();
    let format = SubtitleFormat::from_extension(path)
        .ok_or_else(|| SubtitleError::UnknownFormat(path.to_path_buf()))?;
    let content = write_content(transcript, format, mode, grouping)?;
    write_file(path, &content)?;
    tracing::info!("Exported {} captions to {}", format, path.display());
    Ok(format)
}

/// Build a transcript with one chunk per cue.
///
/// Multi-line cue text is joined with spaces. Cues whose range is empty are
/// dropped.
pub fn cues_to_transcript(cues: &[SubtitleCue]) -> Transcript {
    let mut chunks: Vec<TranscriptChunk> = cues
        .iter()
        .filter(|cue| {
            let keep = cue.end > cue.start;
            if !keep {
                tracing::debug!("Dropping empty cue #{} at {:.3}s", cue.index, cue.start);
            }
            keep
        })
        .map(|cue| {
            let text = cue.text.split_whitespace().collect::<Vec<_>>().join(" ");
            TranscriptChunk::new(text, cue.start, cue.end)
        })
        .collect();
    chunks.sort_by(|a, b| a.timestamp.start.total_cmp(&b.timestamp.start));
    Transcript::from_chunks(chunks)
}

/// Load a transcript from a `.json`, `.srt` or `.vtt` file.
pub fn import_file(path: impl AsRef<Path>) -> Result<Transcript, SubtitleError> {
    let path = path.as_ref();
    match SubtitleFormat::from_extension(path) {
        Some(SubtitleFormat::Json) => {
            let content = fs::read_to_string(path).map_err(|e| SubtitleError::read(path, e))?;
            let mut transcript: Transcript = serde_json::from_str(&content)?;
            transcript
                .chunks
                .sort_by(|a, b| a.timestamp.start.total_cmp(&b.timestamp.start));
            transcript.refresh_text();
            Ok(transcript)
        }
        Some(_) => Ok(cues_to_transcript(&parse_file(path)?)),
        None => Err(SubtitleError::UnknownFormat(path.to_path_buf())),
    }
}
