//! Transcript chunk processing.
//!
//! Turns the recognizer's word-level chunks into display units. Word mode
//! is the identity mapping; phrase mode groups consecutive words and records
//! which source chunks each phrase owns.

use std::ops::Range;

use super::types::{
    DisplayMode, PhraseGrouping, ProcessedChunk, TimeRange, Transcript, TranscriptChunk, Word,
};

/// Punctuation that closes a phrase when `break_on_punctuation` is set.
const SENTENCE_END: [char; 3] = ['.', '!', '?'];

/// Process a transcript into display units for the given mode.
pub fn process(
    transcript: &Transcript,
    mode: DisplayMode,
    grouping: &PhraseGrouping,
) -> Vec<ProcessedChunk> {
    match mode {
        DisplayMode::Word => process_words(&transcript.chunks),
        DisplayMode::Phrase => process_phrases(&transcript.chunks, grouping),
    }
}

fn process_words(chunks: &[TranscriptChunk]) -> Vec<ProcessedChunk> {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| ProcessedChunk {
            text: chunk.text.clone(),
            timestamp: chunk.timestamp,
            disabled: chunk.disabled,
            words: None,
            source: i..i + 1,
        })
        .collect()
}

fn process_phrases(chunks: &[TranscriptChunk], grouping: &PhraseGrouping) -> Vec<ProcessedChunk> {
    let mut phrases = Vec::new();
    let mut phrase_start = 0;

    for i in 0..chunks.len() {
        let is_last = i + 1 == chunks.len();
        if is_last || ends_phrase(chunks, phrase_start, i, grouping) {
            phrases.push(build_phrase(chunks, phrase_start..i + 1));
            phrase_start = i + 1;
        }
    }

    tracing::debug!(
        "Grouped {} word chunks into {} phrases",
        chunks.len(),
        phrases.len()
    );
    phrases
}

/// Whether the phrase that began at `start` must close after word `i`.
fn ends_phrase(
    chunks: &[TranscriptChunk],
    start: usize,
    i: usize,
    grouping: &PhraseGrouping,
) -> bool {
    let count = i - start + 1;
    if count >= grouping.max_words.max(1) {
        return true;
    }

    let current = &chunks[i];
    if grouping.break_on_punctuation && current.text.trim_end().ends_with(SENTENCE_END) {
        return true;
    }

    let next = &chunks[i + 1];
    if next.timestamp.start - current.timestamp.end > grouping.max_gap_secs {
        return true;
    }

    next.timestamp.end - chunks[start].timestamp.start > grouping.max_duration_secs
}

fn build_phrase(chunks: &[TranscriptChunk], source: Range<usize>) -> ProcessedChunk {
    let members = &chunks[source.clone()];

    let words: Vec<Word> = members
        .iter()
        .map(|c| Word {
            text: c.text.trim().to_string(),
            timestamp: c.timestamp,
        })
        .collect();

    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    // Groups are never empty: callers pass `start..i + 1`.
    let start = members.first().map(|c| c.timestamp.start).unwrap_or(0.0);
    let end = members.last().map(|c| c.timestamp.end).unwrap_or(start);

    ProcessedChunk {
        text,
        timestamp: TimeRange::new(start, end),
        disabled: members.iter().all(|c| c.disabled),
        words: Some(words),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transcript() -> Transcript {
        Transcript::from_chunks(vec![
            TranscriptChunk::new("The", 0.0, 0.3),
            TranscriptChunk::new("quick", 0.3, 0.6),
            TranscriptChunk::new("fox.", 0.6, 1.0),
            TranscriptChunk::new("It", 1.1, 1.3),
            TranscriptChunk::new("jumps", 1.3, 1.7),
        ])
    }

    #[test]
    fn word_mode_is_identity() {
        let mut transcript = sample_transcript();
        transcript.chunks[1].disabled = true;

        let processed = process(&transcript, DisplayMode::Word, &PhraseGrouping::default());

        assert_eq!(processed.len(), transcript.chunks.len());
        for (chunk, unit) in transcript.chunks.iter().zip(&processed) {
            assert_eq!(unit.text, chunk.text);
            assert_eq!(unit.timestamp, chunk.timestamp);
            assert_eq!(unit.disabled, chunk.disabled);
            assert!(unit.words.is_none());
        }
    }

    #[test]
    fn phrase_breaks_after_sentence_end() {
        let processed = process(
            &sample_transcript(),
            DisplayMode::Phrase,
            &PhraseGrouping::default(),
        );

        assert_eq!(processed.len(), 2);
        assert_eq!(processed[0].text, "The quick fox.");
        assert_eq!(processed[0].source, 0..3);
        assert_eq!(processed[0].timestamp, TimeRange::new(0.0, 1.0));
        assert_eq!(processed[1].text, "It jumps");
        assert_eq!(processed[1].source, 3..5);
    }

    #[test]
    fn phrase_respects_max_words() {
        let chunks = (0..10)
            .map(|i| TranscriptChunk::new(format!("w{}", i), i as f64 * 0.2, i as f64 * 0.2 + 0.2))
            .collect();
        let grouping = PhraseGrouping {
            max_words: 4,
            ..PhraseGrouping::default()
        };

        let processed = process(&Transcript::from_chunks(chunks), DisplayMode::Phrase, &grouping);

        let sizes: Vec<usize> = processed.iter().map(|p| p.word_count()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn phrase_breaks_on_long_gap() {
        let transcript = Transcript::from_chunks(vec![
            TranscriptChunk::new("before", 0.0, 0.5),
            TranscriptChunk::new("after", 3.0, 3.5),
        ]);

        let processed = process(&transcript, DisplayMode::Phrase, &PhraseGrouping::default());
        assert_eq!(processed.len(), 2);
    }

    #[test]
    fn phrase_words_cover_sources_in_order() {
        let transcript = sample_transcript();
        let processed = process(&transcript, DisplayMode::Phrase, &PhraseGrouping::default());

        let mut covered = Vec::new();
        for phrase in &processed {
            let words = phrase.words.as_ref().unwrap();
            assert_eq!(words.len(), phrase.source.len());
            for (word, idx) in words.iter().zip(phrase.source.clone()) {
                assert_eq!(word.timestamp, transcript.chunks[idx].timestamp);
                covered.push(idx);
            }
        }
        assert_eq!(covered, (0..transcript.chunks.len()).collect::<Vec<_>>());
    }

    #[test]
    fn phrase_disabled_only_when_every_word_disabled() {
        let mut transcript = sample_transcript();
        transcript.chunks[0].disabled = true;
        transcript.chunks[1].disabled = true;
        transcript.chunks[3].disabled = true;
        transcript.chunks[4].disabled = true;

        let processed = process(&transcript, DisplayMode::Phrase, &PhraseGrouping::default());

        // First phrase still has "fox." enabled.
        assert!(!processed[0].disabled);
        assert!(processed[1].disabled);
    }

    #[test]
    fn empty_transcript_yields_nothing() {
        let processed = process(
            &Transcript::default(),
            DisplayMode::Phrase,
            &PhraseGrouping::default(),
        );
        assert!(processed.is_empty());
    }
}
