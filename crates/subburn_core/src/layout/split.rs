//! Two-line caption splitting.

/// How far from the midpoint a punctuation break may move the split.
const PUNCTUATION_WINDOW: usize = 2;

fn ends_clause(word: &str) -> bool {
    word.ends_with([',', ';', ':', '.', '!', '?'])
}

/// Index of the first word on the second line, or `None` for one line.
///
/// Splits only above `max_words`. The default split is `ceil(n / 2)`; a
/// word ending in clause punctuation within two words of the midpoint moves
/// the split to just after it, nearest candidate first, earlier on ties.
pub fn split_point<S: AsRef<str>>(words: &[S], max_words: usize) -> Option<usize> {
    let n = words.len();
    if n <= max_words || n < 2 {
        return None;
    }

    let mid = n.div_ceil(2);
    let lo = mid.saturating_sub(PUNCTUATION_WINDOW).max(2);
    let hi = (mid + PUNCTUATION_WINDOW).min(n.saturating_sub(2));

    let punctuated = (lo..=hi)
        .filter(|&i| ends_clause(words[i].as_ref()))
        .map(|i| i + 1)
        .min_by_key(|&split| (split.abs_diff(mid), split));

    Some(punctuated.unwrap_or(mid))
}

/// Split caption text into one or two lines.
pub fn split_lines(text: &str, max_words: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    match split_point(&words, max_words) {
        Some(at) => vec![words[..at].join(" "), words[at..].join(" ")],
        None if words.is_empty() => Vec::new(),
        None => vec![words.join(" ")],
    }
}
