//! Subtitle writers for various formats.
//!
//! Each writer is a pure function from a transcript (plus display mode) to
//! the file's text. Only enabled display units are written.

mod json;
mod srt;
mod vtt;

pub use json::to_json;
pub use srt::{format_srt_time, to_srt, write_srt};
pub use vtt::{format_vtt_time, to_vtt, write_vtt};

use crate::subtitles::error::SubtitleError;
use crate::subtitles::types::{SubtitleCue, SubtitleFormat};
use crate::transcript::{ChunkTimeline, DisplayMode, PhraseGrouping, Transcript};

/// Enabled display units as numbered cues, in time order.
pub fn display_cues(
    transcript: &Transcript,
    mode: DisplayMode,
    grouping: &PhraseGrouping,
) -> Vec<SubtitleCue> {
    ChunkTimeline::build(transcript, mode, grouping)
        .units()
        .iter()
        .enumerate()
        .map(|(i, unit)| {
            SubtitleCue::new(i + 1, unit.timestamp.start, unit.timestamp.end, unit.text.clone())
        })
        .collect()
}

/// Render a transcript as `format` text.
pub fn write_content(
    transcript: &Transcript,
    format: SubtitleFormat,
    mode: DisplayMode,
    grouping: &PhraseGrouping,
) -> Result<String, SubtitleError> {
    Ok(match format {
        SubtitleFormat::Srt => to_srt(transcript, mode, grouping),
        SubtitleFormat::WebVtt => to_vtt(transcript, mode, grouping),
        SubtitleFormat::Json => to_json(transcript)?,
    })
}

/// Milliseconds split into `(hours, minutes, seconds, millis)`.
fn split_millis(seconds: f64) -> (u64, u64, u64, u64) {
    let ms = (seconds * 1000.0).round().max(0.0) as u64;
    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    (total_mins / 60, total_mins % 60, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TranscriptChunk;

    #[test]
    fn cues_skip_disabled_units_and_renumber() {
        let transcript = Transcript::from_chunks(vec![
            TranscriptChunk::new("a", 0.0, 1.0),
            TranscriptChunk::new("b", 1.0, 2.0).disabled(),
            TranscriptChunk::new("c", 2.0, 3.0),
        ]);
        let cues = display_cues(&transcript, DisplayMode::Word, &PhraseGrouping::default());
        assert_eq!(cues.len(), 2);
        assert_eq!((cues[1].index, cues[1].text.as_str()), (2, "c"));
    }

    #[test]
    fn splits_millis() {
        assert_eq!(split_millis(3723.4567), (1, 2, 3, 457));
        assert_eq!(split_millis(-0.2), (0, 0, 0, 0));
    }
}
