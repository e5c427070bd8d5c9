//! Subtitle parsers for various formats.
//!
//! Each parser is a pure function that takes content and returns cues.

mod srt;
mod vtt;

pub use srt::{parse_srt, parse_srt_time};
pub use vtt::{parse_vtt, parse_vtt_time};

use crate::subtitles::error::ParseError;
use crate::subtitles::types::{SubtitleCue, SubtitleFormat};

/// Parse cue content with auto-detection.
///
/// Tries to detect the format from content if not specified. JSON is not a
/// cue format and is parsed as SRT-or-VTT by content.
pub fn parse_content(
    content: &str,
    format: Option<SubtitleFormat>,
) -> Result<Vec<SubtitleCue>, ParseError> {
    match format.unwrap_or_else(|| detect_format(content)) {
        SubtitleFormat::WebVtt => parse_vtt(content),
        SubtitleFormat::Srt | SubtitleFormat::Json => match detect_format(content) {
            SubtitleFormat::WebVtt => parse_vtt(content),
            _ => parse_srt(content),
        },
    }
}

/// Detect cue format from content.
fn detect_format(content: &str) -> SubtitleFormat {
    if content
        .trim_start_matches('\u{feff}')
        .trim_start()
        .starts_with("WEBVTT")
    {
        return SubtitleFormat::WebVtt;
    }
    SubtitleFormat::Srt
}

/// Non-blank runs of lines, each with the 1-based number of its first line.
fn blocks(content: &str) -> Vec<(usize, Vec<&str>)> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut first_line = 0;

    for (i, line) in content.lines().enumerate() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push((first_line, std::mem::take(&mut current)));
            }
            continue;
        }
        if current.is_empty() {
            first_line = i + 1;
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push((first_line, current));
    }

    blocks
}

/// Index and text of the first `start --> end` line in a block.
fn find_timing_line<'a>(lines: &[&'a str]) -> Option<(usize, &'a str)> {
    lines
        .iter()
        .position(|line| line.contains("-->"))
        .map(|i| (i, lines[i]))
}
