//! SRT subtitle writer.
//!
//! # Timing Precision
//!
//! SRT uses millisecond timing (HH:MM:SS,mmm). Second values are rounded to
//! the nearest millisecond at write time.

use crate::subtitles::types::SubtitleCue;
use crate::transcript::{DisplayMode, PhraseGrouping, Transcript};

use super::{display_cues, split_millis};

/// Write a transcript's enabled display units as SRT.
pub fn to_srt(transcript: &Transcript, mode: DisplayMode, grouping: &PhraseGrouping) -> String {
    write_srt(&display_cues(transcript, mode, grouping))
}

/// Write cues as SRT blocks separated by one blank line.
pub fn write_srt(cues: &[SubtitleCue]) -> String {
    let mut output = String::new();

    for (i, cue) in cues.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&format!("{}\n", cue.index));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(cue.start),
            format_srt_time(cue.end)
        ));
        output.push_str(&cue.text);
        output.push('\n');
    }

    output
}

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm).
pub fn format_srt_time(seconds: f64) -> String {
    let (hours, mins, secs, millis) = split_millis(seconds);
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}
