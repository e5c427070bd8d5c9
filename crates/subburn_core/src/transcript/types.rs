//! Core transcript types.
//!
//! All timing values are source-video seconds stored as `f64`. Rounding to
//! milliseconds happens only when a subtitle file is written.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A `(start, end)` pair in seconds.
///
/// Serialized as a two-element array to match the recognizer's output shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length of the range in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `time` falls inside the half-open range `[start, end)`.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }

    /// Whether `start < end` and both bounds are finite.
    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start < self.end
    }
}

impl From<(f64, f64)> for TimeRange {
    fn from((start, end): (f64, f64)) -> Self {
        Self { start, end }
    }
}

impl From<TimeRange> for (f64, f64) {
    fn from(range: TimeRange) -> Self {
        (range.start, range.end)
    }
}

/// One recognized fragment of speech, usually a single word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub text: String,
    pub timestamp: TimeRange,
    /// Excluded from the exported timeline.
    #[serde(default)]
    pub disabled: bool,
}

impl TranscriptChunk {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            timestamp: TimeRange::new(start, end),
            disabled: false,
        }
    }

    /// Builder-style helper to mark the chunk disabled.
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// A full transcript as produced by the recognizer and edited by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Full text of the transcript.
    #[serde(default)]
    pub text: String,
    /// Word-level chunks sorted by start time.
    #[serde(default)]
    pub chunks: Vec<TranscriptChunk>,
}

impl Transcript {
    /// Build a transcript from chunks, deriving `text`.
    pub fn from_chunks(chunks: Vec<TranscriptChunk>) -> Self {
        let mut transcript = Self {
            text: String::new(),
            chunks,
        };
        transcript.refresh_text();
        transcript
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Enabled chunk texts joined by a single space.
    ///
    /// Disabled chunks are left out, so the header text always matches what
    /// ends up in the exported timeline.
    pub fn plain_text(&self) -> String {
        self.chunks
            .iter()
            .filter(|c| !c.disabled)
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Recompute `text` from the chunk list.
    pub fn refresh_text(&mut self) {
        self.text = self.plain_text();
    }
}

/// A word inside a phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub timestamp: TimeRange,
}

/// A display unit: one chunk in word mode, a group of chunks in phrase mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedChunk {
    pub text: String,
    pub timestamp: TimeRange,
    pub disabled: bool,
    /// Constituent words, present only in phrase mode.
    pub words: Option<Vec<Word>>,
    /// Indices of the transcript chunks this unit was built from.
    pub source: Range<usize>,
}

impl ProcessedChunk {
    /// Number of words, falling back to whitespace splitting in word mode.
    pub fn word_count(&self) -> usize {
        match &self.words {
            Some(words) => words.len(),
            None => self.text.split_whitespace().count(),
        }
    }
}

/// Caption grouping and display strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// One caption per recognized word.
    Word,
    /// Consecutive words grouped into phrases.
    #[default]
    Phrase,
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayMode::Word => write!(f, "word"),
            DisplayMode::Phrase => write!(f, "phrase"),
        }
    }
}

impl std::str::FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" => Ok(Self::Word),
            "phrase" => Ok(Self::Phrase),
            other => Err(format!("unknown display mode '{}'", other)),
        }
    }
}

/// Boundary policy used to group word chunks into phrases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseGrouping {
    /// Maximum words per phrase.
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    /// Silence longer than this starts a new phrase.
    #[serde(default = "default_max_gap")]
    pub max_gap_secs: f64,
    /// Upper bound on a phrase's on-screen time.
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f64,
    /// End a phrase after a word ending in `.`, `!` or `?`.
    #[serde(default = "default_true")]
    pub break_on_punctuation: bool,
}

fn default_max_words() -> usize {
    7
}

fn default_max_gap() -> f64 {
    0.75
}

fn default_max_duration() -> f64 {
    4.0
}

fn default_true() -> bool {
    true
}

impl Default for PhraseGrouping {
    fn default() -> Self {
        Self {
            max_words: default_max_words(),
            max_gap_secs: default_max_gap(),
            max_duration_secs: default_max_duration(),
            break_on_punctuation: true,
        }
    }
}
