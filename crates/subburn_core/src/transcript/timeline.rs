//! Render-side view of the display units.

use super::processor::process;
use super::types::{DisplayMode, PhraseGrouping, ProcessedChunk, Transcript};

/// Enabled display units in time order, queried per frame.
///
/// A unit is absent from the timeline only when it is fully disabled: a
/// word chunk with its flag set, or a phrase whose every word is disabled.
/// Partially disabled phrases stay on screen with all of their words.
#[derive(Debug, Clone, Default)]
pub struct ChunkTimeline {
    units: Vec<ProcessedChunk>,
}

impl ChunkTimeline {
    /// Build the timeline for a transcript in the given mode.
    pub fn build(transcript: &Transcript, mode: DisplayMode, grouping: &PhraseGrouping) -> Self {
        Self::from_units(process(transcript, mode, grouping))
    }

    /// Build from already processed units, dropping disabled ones.
    pub fn from_units(units: Vec<ProcessedChunk>) -> Self {
        let total = units.len();
        let units: Vec<ProcessedChunk> = units.into_iter().filter(|u| !u.disabled).collect();
        tracing::debug!(
            "Caption timeline: {} of {} units enabled",
            units.len(),
            total
        );
        Self { units }
    }

    /// First enabled unit whose `[start, end)` contains `time`.
    pub fn active_at(&self, time: f64) -> Option<&ProcessedChunk> {
        self.units.iter().find(|u| u.timestamp.contains(time))
    }

    pub fn units(&self) -> &[ProcessedChunk] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
