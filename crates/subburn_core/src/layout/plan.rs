//! Caption render plans.

use crate::style::{Color, SubtitleStyle};
use crate::transcript::{DisplayMode, ProcessedChunk, TimeRange, Word};

use super::metrics::FrameMetrics;
use super::split::split_point;
use super::{FontSpec, TextMeasure};

const EMPHASIS_SCALE: f32 = 1.18;
const WORD_GAP_EM: f32 = 0.35;
const HIGHLIGHT_PAD_X_EM: f32 = 0.15;
const HIGHLIGHT_PAD_Y_EM: f32 = 0.08;
const HIGHLIGHT_RADIUS_EM: f32 = 0.35;

const BACKGROUND_RADIUS: f32 = 8.0;
const BACKGROUND_PAD_X: f32 = 12.0;
const BACKGROUND_PAD_Y: f32 = 8.0;

const GRADIENT_HALF_HEIGHT: f32 = 20.0;
const SHADOW_OFFSET: f32 = 2.0;
const LINE_SHADOW_BLUR: f32 = 4.0;
const WORD_SHADOW_BLUR: f32 = 5.0;

/// A filled rounded rectangle in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    pub color: Color,
}

impl RoundedBox {
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32, radius: f32, color: Color) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
            radius,
            color,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// How glyph interiors are painted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Solid(Color),
    /// Vertical white-silver-grey gradient spanning `±half_height` around the
    /// text centre.
    Metallic { half_height: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Color,
    pub offset: f32,
    pub blur: f32,
}

/// One piece of text drawn centred on a point.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Upper-cased text.
    pub text: String,
    pub center_x: f32,
    pub center_y: f32,
    /// Font for this run, already scaled for emphasis.
    pub font: FontSpec,
    /// Emphasis scale (1.0 unless the word is active).
    pub scale: f32,
    /// Width of the run at `font`.
    pub width: f32,
    pub fill: Fill,
    pub stroke: Option<Stroke>,
    pub shadow: Option<Shadow>,
    /// Highlight box painted behind an active word.
    pub highlight: Option<RoundedBox>,
}

impl TextRun {
    pub fn is_active(&self) -> bool {
        self.highlight.is_some()
    }
}

/// Everything needed to draw one caption onto one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub frame: FrameMetrics,
    pub background: Option<RoundedBox>,
    /// Lines in top-to-bottom order, each holding one run (plain) or one run
    /// per word (emphasis).
    pub lines: Vec<Vec<TextRun>>,
}

impl RenderPlan {
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }

    pub fn runs(&self) -> impl Iterator<Item = &TextRun> {
        self.lines.iter().flatten()
    }
}

/// Lay out a caption for the frame at `time`.
///
/// Word emphasis applies in phrase mode when the style enables it and the
/// unit carries its words; otherwise each line is one plain run.
pub fn plan_caption<M: TextMeasure + ?Sized>(
    chunk: &ProcessedChunk,
    style: &SubtitleStyle,
    frame_size: (u32, u32),
    mode: DisplayMode,
    time: f64,
    measure: &M,
) -> RenderPlan {
    let frame = FrameMetrics::new(frame_size.0, frame_size.1, style.font_size);
    let base_font = FontSpec::new(style.font_candidates(), style.font_weight, frame.font_px);

    let emphasis_words = match (&chunk.words, mode) {
        (Some(words), DisplayMode::Phrase)
            if style.word_emphasis && !words.is_empty() && time.is_finite() =>
        {
            Some(words.as_slice())
        }
        _ => None,
    };

    let lines = match emphasis_words {
        Some(words) => emphasis_lines(words, style, &frame, &base_font, time, measure),
        None => plain_lines(&chunk.text, style, &frame, &base_font, measure),
    };

    if lines.iter().all(|l| l.is_empty()) {
        return RenderPlan {
            frame,
            background: None,
            lines: Vec::new(),
        };
    }

    let (block_top, block_height) = block_extent(&frame, lines.len());
    let background = style.background().map(|color| {
        let widest = lines.iter().map(|l| line_width(l, &frame)).fold(0.0, f32::max);
        let pad_x = BACKGROUND_PAD_X * frame.scale;
        let pad_y = BACKGROUND_PAD_Y * frame.scale;
        RoundedBox {
            x: frame.center_x - widest / 2.0 - pad_x,
            y: block_top - pad_y,
            width: widest + pad_x * 2.0,
            height: block_height + pad_y * 2.0,
            radius: BACKGROUND_RADIUS * frame.scale,
            color,
        }
    });

    RenderPlan {
        frame,
        background,
        lines,
    }
}

/// Top edge and total height of a stack of `count` lines.
fn block_extent(frame: &FrameMetrics, count: usize) -> (f32, f32) {
    let gaps = count.saturating_sub(1) as f32;
    let height = count as f32 * frame.font_px + gaps * frame.line_gap();
    (frame.baseline_y - height / 2.0, height)
}

/// Centre y of line `index`.
fn line_center_y(frame: &FrameMetrics, count: usize, index: usize) -> f32 {
    let (top, _) = block_extent(frame, count);
    top + frame.font_px / 2.0 + index as f32 * (frame.font_px + frame.line_gap())
}

/// Rendered width of a line: run widths plus inter-word gaps.
fn line_width(runs: &[TextRun], frame: &FrameMetrics) -> f32 {
    let words: f32 = runs.iter().map(|r| r.width).sum();
    let gaps = runs.len().saturating_sub(1) as f32 * WORD_GAP_EM * frame.font_px;
    words + gaps
}

fn text_fill(style: &SubtitleStyle, frame: &FrameMetrics) -> Fill {
    if style.is_metallic() {
        Fill::Metallic {
            half_height: GRADIENT_HALF_HEIGHT * frame.scale,
        }
    } else {
        Fill::Solid(style.color)
    }
}

fn shadow(style: &SubtitleStyle, frame: &FrameMetrics, blur_factor: f32) -> Option<Shadow> {
    let intensity = style.drop_shadow_intensity;
    (intensity > 0.0).then(|| Shadow {
        color: Color::BLACK.with_opacity(intensity.min(1.0)),
        offset: SHADOW_OFFSET * frame.scale,
        blur: (intensity * blur_factor * frame.scale).max(2.0),
    })
}

/// Stroke for text drawn at `scale`; the width is set in unscaled space and
/// then scaled with the glyphs.
fn stroke(style: &SubtitleStyle, frame: &FrameMetrics, scale: f32) -> Option<Stroke> {
    (style.border_width > 0.0).then(|| Stroke {
        width: (style.border_width * frame.scale / scale.max(0.001)).max(0.5) * scale,
        color: style.border_color,
    })
}

fn plain_lines<M: TextMeasure + ?Sized>(
    text: &str,
    style: &SubtitleStyle,
    frame: &FrameMetrics,
    font: &FontSpec,
    measure: &M,
) -> Vec<Vec<TextRun>> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let texts = match split_point(&words, frame.max_words_per_line) {
        Some(at) => vec![words[..at].join(" "), words[at..].join(" ")],
        None => vec![words.join(" ")],
    };
    let count = texts.len();

    texts
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            let text = line.to_uppercase();
            let width = measure.measure(&text, font);
            vec![TextRun {
                text,
                center_x: frame.center_x,
                center_y: line_center_y(frame, count, index),
                font: font.clone(),
                scale: 1.0,
                width,
                fill: text_fill(style, frame),
                stroke: stroke(style, frame, 1.0),
                shadow: shadow(style, frame, LINE_SHADOW_BLUR),
                highlight: None,
            }]
        })
        .collect()
}

fn emphasis_lines<M: TextMeasure + ?Sized>(
    words: &[Word],
    style: &SubtitleStyle,
    frame: &FrameMetrics,
    font: &FontSpec,
    time: f64,
    measure: &M,
) -> Vec<Vec<TextRun>> {
    // An edited word can hold several display words; each one shares the
    // source word's timing. Blank words are dropped.
    let tokens: Vec<(&str, TimeRange)> = words
        .iter()
        .flat_map(|w| w.text.split_whitespace().map(move |t| (t, w.timestamp)))
        .collect();
    let texts: Vec<&str> = tokens.iter().map(|(text, _)| *text).collect();
    let groups: Vec<&[(&str, TimeRange)]> = match split_point(&texts, frame.max_words_per_line) {
        Some(at) => vec![&tokens[..at], &tokens[at..]],
        None => vec![&tokens[..]],
    };
    let count = groups.len();

    let (highlight_color, active_text) = if style.color.is_light() {
        (Color::BLACK.with_opacity(0.65), Color::WHITE)
    } else {
        (Color::WHITE.with_opacity(0.85), Color::BLACK)
    };

    groups
        .into_iter()
        .enumerate()
        .map(|(index, group)| {
            let center_y = line_center_y(frame, count, index);
            let gap = WORD_GAP_EM * frame.font_px;

            let sized: Vec<(String, f32, f32)> = group
                .iter()
                .map(|(token, timestamp)| {
                    let text = token.to_uppercase();
                    let scale = if timestamp.contains(time) {
                        EMPHASIS_SCALE
                    } else {
                        1.0
                    };
                    let width = measure.measure(&text, font) * scale;
                    (text, scale, width)
                })
                .collect();

            let total: f32 = sized.iter().map(|(_, _, w)| w).sum::<f32>()
                + gap * sized.len().saturating_sub(1) as f32;
            let mut cursor = frame.center_x - total / 2.0;

            sized
                .into_iter()
                .map(|(text, scale, width)| {
                    let center_x = cursor + width / 2.0;
                    cursor += width + gap;
                    let active = scale > 1.0;

                    let highlight = active.then(|| {
                        RoundedBox::centered(
                            center_x,
                            center_y,
                            width + 2.0 * HIGHLIGHT_PAD_X_EM * frame.font_px,
                            frame.font_px * scale + 2.0 * HIGHLIGHT_PAD_Y_EM * frame.font_px,
                            HIGHLIGHT_RADIUS_EM * frame.font_px,
                            highlight_color,
                        )
                    });
                    let fill = if active {
                        Fill::Solid(active_text)
                    } else {
                        text_fill(style, frame)
                    };

                    TextRun {
                        text,
                        center_x,
                        center_y,
                        font: font.scaled(scale),
                        scale,
                        width,
                        fill,
                        stroke: stroke(style, frame, scale),
                        shadow: shadow(style, frame, WORD_SHADOW_BLUR),
                        highlight,
                    }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixedWidthText;
    use crate::transcript::{process, PhraseGrouping, Transcript, TranscriptChunk};

    fn phrase(words: &[(&str, f64, f64)]) -> ProcessedChunk {
        let transcript = Transcript::from_chunks(
            words
                .iter()
                .map(|(t, s, e)| TranscriptChunk::new(*t, *s, *e))
                .collect(),
        );
        let grouping = PhraseGrouping {
            max_words: 20,
            break_on_punctuation: false,
            max_duration_secs: 60.0,
            ..PhraseGrouping::default()
        };
        process(&transcript, DisplayMode::Phrase, &grouping)
            .into_iter()
            .next()
            .unwrap()
    }

    #[test]
    fn plain_plan_is_uppercase_and_centred() {
        let chunk = phrase(&[("hello", 0.0, 1.0)]);
        let style = SubtitleStyle::default();
        let plan = plan_caption(&chunk, &style, (1920, 1080), DisplayMode::Word, 0.5, &FixedWidthText);

        assert_eq!(plan.lines.len(), 1);
        let run = &plan.lines[0][0];
        assert_eq!(run.text, "HELLO");
        assert_eq!(run.center_x, 960.0);
        assert!((run.center_y - plan.frame.baseline_y).abs() < 1e-3);
        assert!(run.highlight.is_none());
    }

    #[test]
    fn background_wraps_widest_line() {
        let chunk = phrase(&[("hi", 0.0, 1.0)]);
        let style = SubtitleStyle::default();
        let plan = plan_caption(&chunk, &style, (1920, 1080), DisplayMode::Word, 0.5, &FixedWidthText);

        let run = &plan.lines[0][0];
        let bg = plan.background.expect("default style has a background");
        assert!((bg.width - (run.width + 24.0)).abs() < 1e-3);
        assert!((bg.height - (30.0 + 16.0)).abs() < 1e-3);
        assert_eq!(bg.radius, 8.0);
        let (cx, cy) = bg.center();
        assert!((cx - 960.0).abs() < 1e-3);
        assert!((cy - plan.frame.baseline_y).abs() < 1e-3);

        let clear = style.with_background(None);
        let plan = plan_caption(&chunk, &clear, (1920, 1080), DisplayMode::Word, 0.5, &FixedWidthText);
        assert!(plan.background.is_none());
    }

    #[test]
    fn long_portrait_caption_uses_two_lines() {
        let chunk = phrase(&[
            ("one", 0.0, 0.2),
            ("two", 0.2, 0.4),
            ("three", 0.4, 0.6),
            ("four", 0.6, 0.8),
            ("five", 0.8, 1.0),
        ]);
        let style = SubtitleStyle::default().with_word_emphasis(false);
        let plan = plan_caption(&chunk, &style, (1080, 1920), DisplayMode::Phrase, 0.1, &FixedWidthText);

        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0][0].text, "ONE TWO THREE");
        assert_eq!(plan.lines[1][0].text, "FOUR FIVE");
        let gap = plan.lines[1][0].center_y - plan.lines[0][0].center_y;
        assert!((gap - (plan.frame.font_px + plan.frame.line_gap())).abs() < 1e-3);
    }

    #[test]
    fn single_active_word_at_shared_boundary() {
        let chunk = phrase(&[("one", 0.0, 0.5), ("two", 0.5, 1.0), ("three", 1.0, 1.5)]);
        let style = SubtitleStyle::default();
        let plan = plan_caption(&chunk, &style, (1920, 1080), DisplayMode::Phrase, 0.5, &FixedWidthText);

        let active: Vec<&str> = plan
            .runs()
            .filter(|r| r.is_active())
            .map(|r| r.text.as_str())
            .collect();
        assert_eq!(active, vec!["TWO"]);
    }

    #[test]
    fn eight_word_phrase_marks_only_the_current_word() {
        let words: Vec<(String, f64, f64)> = (0..8)
            .map(|i| (format!("w{}", i + 1), i as f64 * 0.4, (i + 1) as f64 * 0.4))
            .collect();
        let spans: Vec<(&str, f64, f64)> = words.iter().map(|(t, s, e)| (t.as_str(), *s, *e)).collect();
        let chunk = phrase(&spans);
        let style = SubtitleStyle::default();
        let plan = plan_caption(&chunk, &style, (1920, 1080), DisplayMode::Phrase, 1.0, &FixedWidthText);

        assert_eq!(plan.lines.len(), 2);
        let runs: Vec<&TextRun> = plan.runs().collect();
        assert_eq!(runs.len(), 8);
        for (i, run) in runs.iter().enumerate() {
            assert_eq!(run.is_active(), i == 2, "word {}", i + 1);
            let expected = if i == 2 { EMPHASIS_SCALE } else { 1.0 };
            assert_eq!(run.scale, expected);
        }
    }

    #[test]
    fn active_word_is_scaled_and_highlighted() {
        let chunk = phrase(&[("one", 0.0, 0.5), ("two", 0.5, 1.0)]);
        let style = SubtitleStyle::default();
        let font_px = 30.0;
        let plan = plan_caption(&chunk, &style, (1920, 1080), DisplayMode::Phrase, 0.2, &FixedWidthText);

        let runs: Vec<&TextRun> = plan.runs().collect();
        assert_eq!(runs[0].scale, EMPHASIS_SCALE);
        assert_eq!(runs[1].scale, 1.0);

        let base = FixedWidthText.measure("ONE", &runs[1].font);
        assert!((runs[0].width - base * EMPHASIS_SCALE).abs() < 1e-3);

        let highlight = runs[0].highlight.unwrap();
        assert!((highlight.width - (runs[0].width + 2.0 * 0.15 * font_px)).abs() < 1e-3);
        assert!((highlight.height - (font_px * 1.18 + 2.0 * 0.08 * font_px)).abs() < 1e-3);
        // Gold text is light, so the highlight is dark with white text.
        assert_eq!(highlight.color, Color::rgba(0, 0, 0, 166));
        assert_eq!(runs[0].fill, Fill::Solid(Color::WHITE));
        assert_eq!(runs[1].fill, Fill::Solid(style.color));

        // Words are laid out left to right with the 0.35em gap.
        let gap = runs[1].center_x - runs[1].width / 2.0 - (runs[0].center_x + runs[0].width / 2.0);
        assert!((gap - 0.35 * font_px).abs() < 1e-3);
    }

    #[test]
    fn edited_phrase_splits_the_same_with_emphasis() {
        let grouping = PhraseGrouping {
            max_words: 20,
            break_on_punctuation: false,
            max_duration_secs: 60.0,
            ..PhraseGrouping::default()
        };
        let mut transcript = Transcript::from_chunks(vec![
            TranscriptChunk::new("one", 0.0, 0.5),
            TranscriptChunk::new("two", 0.5, 1.0),
            TranscriptChunk::new("three", 1.0, 1.5),
        ]);
        transcript
            .replace_text(
                DisplayMode::Phrase,
                &grouping,
                0,
                "one two three four five six seven eight nine",
            )
            .unwrap();
        let chunk = process(&transcript, DisplayMode::Phrase, &grouping).remove(0);

        let style = SubtitleStyle::default();
        let emphasized =
            plan_caption(&chunk, &style, (1920, 1080), DisplayMode::Phrase, 0.2, &FixedWidthText);
        let plain = plan_caption(
            &chunk,
            &style.with_word_emphasis(false),
            (1920, 1080),
            DisplayMode::Phrase,
            0.2,
            &FixedWidthText,
        );

        assert_eq!(plain.lines.len(), 2);
        assert_eq!(emphasized.lines.len(), 2);
        for (runs, plain_line) in emphasized.lines.iter().zip(&plain.lines) {
            let joined: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
            assert_eq!(joined.join(" "), plain_line[0].text);
        }
        assert_eq!(emphasized.runs().count(), 9);

        let active: Vec<&str> = emphasized
            .runs()
            .filter(|r| r.is_active())
            .map(|r| r.text.as_str())
            .collect();
        assert_eq!(active, vec!["ONE"]);

        // Words folded into the last chunk share its timing.
        let late = plan_caption(&chunk, &style, (1920, 1080), DisplayMode::Phrase, 1.2, &FixedWidthText);
        assert_eq!(late.runs().filter(|r| r.is_active()).count(), 7);
    }

    #[test]
    fn blank_words_take_no_space() {
        let chunk = phrase(&[("one", 0.0, 0.5), ("  ", 0.5, 1.0), ("two", 1.0, 1.5)]);
        let style = SubtitleStyle::default();
        let font_px = 30.0;
        let plan = plan_caption(&chunk, &style, (1920, 1080), DisplayMode::Phrase, 0.2, &FixedWidthText);

        let runs: Vec<&TextRun> = plan.runs().collect();
        assert_eq!(runs.len(), 2);
        let gap = runs[1].center_x - runs[1].width / 2.0 - (runs[0].center_x + runs[0].width / 2.0);
        assert!((gap - 0.35 * font_px).abs() < 1e-3);
    }

    #[test]
    fn dark_text_gets_light_highlight() {
        let chunk = phrase(&[("one", 0.0, 0.5)]);
        let style = SubtitleStyle::default().with_color(Color::rgb(0x10, 0x10, 0x10));
        let plan = plan_caption(&chunk, &style, (1920, 1080), DisplayMode::Phrase, 0.1, &FixedWidthText);

        let run = &plan.lines[0][0];
        assert_eq!(run.highlight.unwrap().color, Color::rgba(255, 255, 255, 217));
        assert_eq!(run.fill, Fill::Solid(Color::BLACK));
    }

    #[test]
    fn word_mode_never_emphasizes() {
        let chunk = phrase(&[("one", 0.0, 0.5), ("two", 0.5, 1.0)]);
        let plan = plan_caption(
            &chunk,
            &SubtitleStyle::default(),
            (1920, 1080),
            DisplayMode::Word,
            0.2,
            &FixedWidthText,
        );
        assert!(plan.runs().all(|r| !r.is_active()));
        assert_eq!(plan.lines[0].len(), 1);
    }

    #[test]
    fn effects_follow_style() {
        let chunk = phrase(&[("one", 0.0, 0.5)]);
        let style = SubtitleStyle::default()
            .with_color(Color::rgb(0xCC, 0xCC, 0xCC))
            .with_border(2.0, Color::BLACK)
            .with_drop_shadow(0.4)
            .with_word_emphasis(false);
        let plan = plan_caption(&chunk, &style, (1920, 1080), DisplayMode::Word, 0.1, &FixedWidthText);
        let run = &plan.lines[0][0];

        assert_eq!(run.fill, Fill::Metallic { half_height: 20.0 });
        assert_eq!(run.stroke.unwrap().width, 2.0);
        let shadow = run.shadow.unwrap();
        assert_eq!(shadow.offset, 2.0);
        assert_eq!(shadow.blur, 2.0);
        assert_eq!(shadow.color, Color::rgba(0, 0, 0, 102));

        let flat = style.with_border(0.0, Color::BLACK).with_drop_shadow(0.0);
        let plan = plan_caption(&chunk, &flat, (1920, 1080), DisplayMode::Word, 0.1, &FixedWidthText);
        assert!(plan.lines[0][0].stroke.is_none());
        assert!(plan.lines[0][0].shadow.is_none());
    }

    #[test]
    fn blank_text_yields_empty_plan() {
        let chunk = phrase(&[("   ", 0.0, 0.5)]);
        let plan = plan_caption(
            &chunk,
            &SubtitleStyle::default(),
            (1920, 1080),
            DisplayMode::Word,
            0.1,
            &FixedWidthText,
        );
        assert!(plan.is_empty());
        assert!(plan.background.is_none());
    }
}
