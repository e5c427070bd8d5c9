//! WebVTT subtitle writer.

use crate::subtitles::types::SubtitleCue;
use crate::transcript::{DisplayMode, PhraseGrouping, Transcript};

use super::{display_cues, split_millis};

/// Write a transcript's enabled display units as WebVTT.
pub fn to_vtt(transcript: &Transcript, mode: DisplayMode, grouping: &PhraseGrouping) -> String {
    write_vtt(&display_cues(transcript, mode, grouping))
}

/// `WEBVTT` header, a blank line, then numbered cues separated by blank lines.
pub fn write_vtt(cues: &[SubtitleCue]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for (i, cue) in cues.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&format!("{}\n", cue.index));
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_time(cue.start),
            format_vtt_time(cue.end)
        ));
        output.push_str(&cue.text);
        output.push('\n');
    }

    output
}

/// Format seconds as a WebVTT timestamp (HH:MM:SS.mmm).
pub fn format_vtt_time(seconds: f64) -> String {
    let (hours, mins, secs, millis) = split_millis(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
}
