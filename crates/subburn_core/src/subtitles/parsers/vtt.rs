//! WebVTT subtitle parser.
//!
//! Reads the cue subset this crate writes plus what common players emit:
//! optional cue identifiers, `MM:SS.mmm` short timestamps, cue settings
//! after the end time, and `NOTE`/`STYLE`/`REGION` blocks (skipped).

use crate::subtitles::error::ParseError;
use crate::subtitles::types::SubtitleCue;

use super::srt::{clock_seconds, parse_seconds};
use super::{blocks, find_timing_line};

const HEADER: &str = "WEBVTT";

/// Parse WebVTT content into cues.
pub fn parse_vtt(content: &str) -> Result<Vec<SubtitleCue>, ParseError> {
    let content = content.trim_start_matches('\u{feff}');
    if !content.trim_start().starts_with(HEADER) {
        return Err(ParseError::MissingHeader(HEADER));
    }

    let mut cues = Vec::new();

    for (block_no, (first_line, lines)) in blocks(content).into_iter().enumerate() {
        if block_no == 0 {
            continue;
        }
        let head = lines[0].trim_start();
        if ["NOTE", "STYLE", "REGION"].iter().any(|kw| head.starts_with(kw)) {
            continue;
        }
        let Some((timing_idx, timing_line)) = find_timing_line(&lines) else {
            continue;
        };
        let line_num = first_line + timing_idx;

        let (start, end) = parse_vtt_timing(timing_line)
            .ok_or_else(|| ParseError::invalid_time(line_num, timing_line))?;
        if end < start {
            return Err(ParseError::InvertedCue { line: line_num });
        }

        let text = lines[timing_idx + 1..].join("\n");
        if text.is_empty() {
            continue;
        }

        let index = timing_idx
            .checked_sub(1)
            .and_then(|i| lines[i].trim().parse().ok())
            .unwrap_or(cues.len() + 1);
        cues.push(SubtitleCue::new(index, start, end, text));
    }

    Ok(cues)
}

/// `start --> end [settings...]`
fn parse_vtt_timing(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once("-->")?;
    let end = rest.split_whitespace().next()?;
    Some((parse_vtt_time(start)?, parse_vtt_time(end)?))
}

/// Parse a WebVTT timestamp: `HH:MM:SS.mmm` or `MM:SS.mmm`.
///
/// Returns time in seconds.
pub fn parse_vtt_time(s: &str) -> Option<f64> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<u64>().ok()?, m.parse::<u64>().ok()?, *s),
        [m, s] => (0, m.parse::<u64>().ok()?, *s),
        _ => return None,
    };
    Some(clock_seconds(hours, minutes)? as f64 + parse_seconds(seconds)?)
}
