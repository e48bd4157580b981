//! Text normalization and comparison helpers.
//!
//! Output text goes through [`normalize`]; keys used for equality
//! (repetition detection, title de-duplication) go through
//! [`normalize_key`] / [`normalize_title`]; near-duplicate checks use
//! [`overlap_similarity`].

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const LIGATURES: [(&str, &str); 7] = [
    ("\u{FB00}", "ff"),  // ﬀ
    ("\u{FB01}", "fi"),  // ﬁ
    ("\u{FB02}", "fl"),  // ﬂ
    ("\u{FB03}", "ffi"), // ﬃ
    ("\u{FB04}", "ffl"), // ﬄ
    ("\u{FB05}", "st"),  // ﬅ
    ("\u{FB06}", "st"),  // ﬆ
];

fn hyphenation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Only joins across whitespace so "state-of-the-art" survives.
    RE.get_or_init(|| Regex::new(r"([A-Za-z])-\s+([a-z])").expect("hyphenation regex"))
}

/// Clean text for output: NFC, ligature repair, replacement-char removal,
/// line-break hyphenation repair, whitespace collapse.
pub fn normalize(text: &str) -> String {
    let mut result: String = text.nfc().collect();
    for (ligature, replacement) in LIGATURES {
        if result.contains(ligature) {
            result = result.replace(ligature, replacement);
        }
    }
    result = result.replace('\u{FFFD}', "");
    result = hyphenation_regex().replace_all(&result, "$1$2").into_owned();
    collapse_whitespace(&result)
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Repetition key: lowercase, collapsed whitespace, digits replaced by `#`.
///
/// "Page 3 of 10" and "Page 4 of 10" share a key.
pub fn normalize_key(text: &str) -> String {
    collapse_whitespace(text)
        .chars()
        .flat_map(|c| {
            if c.is_ascii_digit() {
                '#'.to_lowercase()
            } else {
                c.to_lowercase()
            }
        })
        .collect()
}

/// Title key: lowercase with collapsed whitespace.
pub fn normalize_title(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

/// Share of uppercase letters, or `None` with fewer than three letters.
pub fn uppercase_ratio(text: &str) -> Option<f32> {
    let (letters, upper) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(l, u), c| {
            (l + 1, u + usize::from(c.is_uppercase()))
        });
    if letters < 3 {
        None
    } else {
        Some(upper as f32 / letters as f32)
    }
}

/// Split text into sentences at `.`, `!` or `?` followed by whitespace.
///
/// The terminator stays with its sentence; trailing text without a
/// terminator forms the last sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?' | '。' | '！' | '？') {
            let next_is_space = chars.peek().map_or(true, |(_, n)| n.is_whitespace());
            if next_is_space {
                let end = i + c.len_utf8();
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = end;
            }
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Lowercase word set with punctuation stripped.
pub fn word_set(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Overlap coefficient `|A∩B| / min(|A|,|B|)` over word sets.
///
/// Containment of one text in another scores 1.0. Empty text scores 0.0
/// against anything.
pub fn overlap_similarity(a: &str, b: &str) -> f32 {
    let a = word_set(a);
    let b = word_set(b);
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    let shared = a.intersection(&b).count();
    shared as f32 / smaller as f32
}

/// Truncate at a word boundary to at most `max_chars` characters.
pub fn truncate_at_word(text: &str, max_chars: usize) -> &str {
    if text.chars().count() <= max_chars {
        return text;
    }
    let byte_limit = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(i, _)| i);
    let head = &text[..byte_limit];
    match head.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => head[..pos].trim_end(),
        _ => head,
    }
}
