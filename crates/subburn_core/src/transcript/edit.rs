//! User edits on a transcript.
//!
//! Edits are addressed by display index (the position of a unit in the
//! current mode's view). Phrase edits are mapped back to word chunks through
//! each phrase's `source` range, never by matching timestamps.

use super::error::TranscriptError;
use super::processor::process;
use super::types::{DisplayMode, PhraseGrouping, Transcript, TranscriptChunk};

impl Transcript {
    /// Replace the text of a display unit.
    ///
    /// In phrase mode the new text is split on whitespace and assigned to the
    /// phrase's words in order. The last word receives every remaining new
    /// word; words without a replacement keep their old text.
    pub fn replace_text(
        &mut self,
        mode: DisplayMode,
        grouping: &PhraseGrouping,
        index: usize,
        new_text: &str,
    ) -> Result<(), TranscriptError> {
        match mode {
            DisplayMode::Word => {
                let len = self.chunks.len();
                let chunk = self
                    .chunks
                    .get_mut(index)
                    .ok_or_else(|| TranscriptError::index_out_of_range(index, len))?;
                chunk.text = new_text.to_string();
            }
            DisplayMode::Phrase => {
                let units = process(self, mode, grouping);
                let unit = units
                    .get(index)
                    .ok_or_else(|| TranscriptError::index_out_of_range(index, units.len()))?;

                let new_words: Vec<&str> = new_text.split_whitespace().collect();
                let source = unit.source.clone();
                let last = source.len().saturating_sub(1);

                for (offset, chunk_idx) in source.enumerate() {
                    let replacement = if offset == last {
                        new_words.get(offset..).map(|rest| rest.join(" ")).unwrap_or_default()
                    } else {
                        new_words.get(offset).map(|w| w.to_string()).unwrap_or_default()
                    };

                    if !replacement.is_empty() {
                        self.chunks[chunk_idx].text = replacement;
                    }
                }
            }
        }

        self.refresh_text();
        Ok(())
    }

    /// Toggle the disabled flag of a display unit.
    ///
    /// A phrase with any disabled word is re-enabled as a whole; otherwise
    /// all of its words are disabled.
    pub fn toggle_disabled(
        &mut self,
        mode: DisplayMode,
        grouping: &PhraseGrouping,
        index: usize,
    ) -> Result<(), TranscriptError> {
        match mode {
            DisplayMode::Word => {
                let len = self.chunks.len();
                let chunk = self
                    .chunks
                    .get_mut(index)
                    .ok_or_else(|| TranscriptError::index_out_of_range(index, len))?;
                chunk.disabled = !chunk.disabled;
            }
            DisplayMode::Phrase => {
                let units = process(self, mode, grouping);
                let unit = units
                    .get(index)
                    .ok_or_else(|| TranscriptError::index_out_of_range(index, units.len()))?;

                let source = unit.source.clone();
                let any_disabled = self.chunks[source.clone()].iter().any(|c| c.disabled);
                for chunk in &mut self.chunks[source] {
                    chunk.disabled = !any_disabled;
                }
            }
        }

        self.refresh_text();
        Ok(())
    }

    /// Insert a new chunk, keeping the list sorted by start time.
    ///
    /// Returns the index the chunk landed at.
    pub fn insert_chunk(
        &mut self,
        text: &str,
        start: f64,
        end: f64,
    ) -> Result<usize, TranscriptError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TranscriptError::EmptyText);
        }
        if !(start.is_finite() && end.is_finite() && start < end) {
            return Err(TranscriptError::InvalidRange { start, end });
        }

        self.chunks.push(TranscriptChunk::new(text, start, end));
        // Stable sort keeps equal-start chunks in insertion order.
        self.chunks
            .sort_by(|a, b| a.timestamp.start.total_cmp(&b.timestamp.start));
        self.refresh_text();

        let index = self
            .chunks
            .iter()
            .rposition(|c| c.text == text && c.timestamp.start == start && c.timestamp.end == end)
            .unwrap_or(0);
        Ok(index)
    }
}

/// Parse a user-entered time: `21`, `0:21`, `1:02:03.5`.
///
/// Returns seconds, or `None` if the input matches none of the forms.
pub fn parse_time_input(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let seconds = parse_seconds_part(parts.last()?)?;

    match parts.len() {
        1 => Some(seconds),
        2 => {
            let minutes = parse_whole(parts[0])?;
            Some(minutes * 60.0 + seconds)
        }
        3 => {
            let hours = parse_whole(parts[0])?;
            let minutes = parse_whole(parts[1])?;
            Some(hours * 3600.0 + minutes * 60.0 + seconds)
        }
        _ => None,
    }
}

fn parse_whole(s: &str) -> Option<f64> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse::<u64>().ok().map(|v| v as f64)
}

fn parse_seconds_part(s: &str) -> Option<f64> {
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (s, None),
    };
    parse_whole(whole)?;
    if let Some(frac) = frac {
        parse_whole(frac)?;
    }
    s.parse::<f64>().ok()
}
