//! SRT subtitle parser.
//!
//! # Format Overview
//!
//! SRT files consist of sequential entries:
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! Hello, world!
//!
//! 2
//! 00:00:05,000 --> 00:00:08,000
//! This is a test.
//! ```
//!
//! Each entry has an optional index, a timing line, one or more lines of
//! text and a blank line separator.

use crate::subtitles::error::ParseError;
use crate::subtitles::types::SubtitleCue;

use super::{blocks, find_timing_line};

/// Parse SRT content into cues.
///
/// Entries without a timing line are skipped. Missing or malformed indices
/// are replaced by the cue's position.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleCue>, ParseError> {
    let mut cues = Vec::new();

    for (first_line, lines) in blocks(content) {
        let Some((timing_idx, timing_line)) = find_timing_line(&lines) else {
            continue;
        };
        let line_num = first_line + timing_idx;

        let (start, end) = parse_srt_timing(timing_line)
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

/// Parse SRT timing line: `HH:MM:SS,mmm --> HH:MM:SS,mmm`
fn parse_srt_timing(line: &str) -> Option<(f64, f64)> {
    let (start, end) = line.split_once("-->")?;
    Some((parse_srt_time(start)?, parse_srt_time(end)?))
}

/// Parse SRT timestamp: `HH:MM:SS,mmm` or `HH:MM:SS.mmm`
///
/// Returns time in seconds.
pub fn parse_srt_time(s: &str) -> Option<f64> {
    let s = s.trim().replace(',', ".");

    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: u64 = parts[0].parse().ok()?;
    let minutes: u64 = parts[1].parse().ok()?;
    let seconds = parse_seconds(parts[2])?;

    Some(clock_seconds(hours, minutes)? as f64 + seconds)
}

/// Whole seconds in `hours:minutes`, or `None` when the fields overflow.
pub(super) fn clock_seconds(hours: u64, minutes: u64) -> Option<u64> {
    hours.checked_mul(3600)?.checked_add(minutes.checked_mul(60)?)
}

/// Parse `SS` or `SS.fff` with any number of fraction digits.
pub(super) fn parse_seconds(s: &str) -> Option<f64> {
    let (whole, fraction) = match s.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (s, ""),
    };
    let whole: u64 = whole.parse().ok()?;
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let fraction: f64 = if fraction.is_empty() {
        0.0
    } else {
        format!("0.{}", fraction).parse().ok()?
    };
    Some(whole as f64 + fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_fields_are_rejected() {
        assert_eq!(parse_srt_time("18446744073709551615:00:00,000"), None);
        assert_eq!(parse_srt_time("00:18446744073709551615:00,000"), None);
        assert_eq!(parse_srt_time("1000000:00:00,000"), Some(3_600_000_000.0));
    }

    #[test]
    fn test_parse_srt_time() {
        assert_eq!(parse_srt_time("00:00:00,000"), Some(0.0));
        assert_eq!(parse_srt_time("00:00:01,500"), Some(1.5));
        assert_eq!(parse_srt_time("00:01:00,000"), Some(60.0));
        assert_eq!(parse_srt_time("01:00:00,000"), Some(3600.0));
        assert_eq!(parse_srt_time("00:00:01.5"), Some(1.5));
        assert_eq!(parse_srt_time("00:01,000"), None);
        assert_eq!(parse_srt_time("aa:00:01,000"), None);
    }

    #[test]
    fn test_parse_basic_srt() {
        let content = r#"1
00:00:01,000 --> 00:00:04,000
Hello, world!

2
00:00:05,000 --> 00:00:08,000
This is a test.
With multiple lines.

3
00:00:09,000 --> 00:00:12,000
Final subtitle.
"#;

        let cues = parse_srt(content).unwrap();

        assert_eq!(cues.len(), 3);
        assert_eq!(cues[0], SubtitleCue::new(1, 1.0, 4.0, "Hello, world!"));
        assert_eq!(cues[1].text, "This is a test.\nWith multiple lines.");
        assert_eq!((cues[2].index, cues[2].start, cues[2].end), (3, 9.0, 12.0));
    }

    #[test]
    fn test_parse_srt_without_index() {
        let content = "\n00:00:01,000 --> 00:00:04,000\nHello, world!\n\n00:00:05,000 --> 00:00:08,000\nAnother line.\n";

        let cues = parse_srt(content).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[1].index, 2);
    }

    #[test]
    fn handles_crlf_line_endings() {
        let content = "1\r\n00:00:01,000 --> 00:00:02,000\r\nHi\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nBye\r\n";
        let cues = parse_srt(content).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[1].text, "Bye");
    }

    #[test]
    fn bad_timing_reports_line() {
        let content = "1\n00:00:01,000 --> 00:00:02,000\nok\n\n2\n00:00:xx,000 --> 00:00:04,000\nbad\n";
        let err = parse_srt(content).unwrap_err();
        assert!(matches!(err, ParseError::InvalidTime { line: 6, .. }));
    }

    #[test]
    fn inverted_cue_is_rejected() {
        let content = "1\n00:00:05,000 --> 00:00:01,000\nbackwards\n";
        assert!(matches!(
            parse_srt(content),
            Err(ParseError::InvertedCue { line: 2 })
        ));
    }
}
