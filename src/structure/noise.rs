//! Running header/footer and page-number detection.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;

use crate::config::NoiseConfig;
use crate::model::RawLine;
use crate::text::normalize_key;

fn page_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:page\s+\d+(?:\s+of\s+\d+)?|-\s*\d+\s*-|\d+\s*/\s*\d+|\d+)$")
            .expect("page number regex")
    })
}

fn roman_numeral_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Case-sensitive: "I" or "V" alone are more likely words or labels.
    RE.get_or_init(|| Regex::new(r"^x{0,3}(?:ix|iv|v?i{0,3})$").expect("roman numeral regex"))
}

/// Check whether a line's text is a page number.
pub fn is_page_number(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    page_number_regex().is_match(trimmed) || roman_numeral_regex().is_match(trimmed)
}

/// Minimum number of distinct pages a line must repeat on.
fn repeat_threshold(page_count: u32, config: &NoiseConfig) -> usize {
    let fraction = (config.min_page_fraction * page_count as f32).ceil() as usize;
    fraction.max(2)
}

/// Compute the noise mask of one document's lines.
///
/// The mask has one flag per input line; `true` marks a header, footer,
/// page number or empty line.
pub fn noise_mask(lines: &[RawLine], page_count: u32, config: &NoiseConfig) -> Vec<bool> {
    let mut mask: Vec<bool> = lines
        .iter()
        .map(|line| line.text.trim().is_empty() || is_page_number(&line.text))
        .collect();

    if page_count < 2 {
        return mask;
    }

    let threshold = repeat_threshold(page_count, config);

    // key -> indices of lines carrying it
    let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, line) in lines.iter().enumerate() {
        if mask[i] || line.char_count() > config.max_repeated_chars {
            continue;
        }
        by_key.entry(normalize_key(&line.text)).or_default().push(i);
    }

    for indices in by_key.values() {
        if indices.len() < threshold {
            continue;
        }
        for &i in indices {
            let y = lines[i].bbox.y0;
            let pages: BTreeSet<u32> = indices
                .iter()
                .filter(|&&j| (lines[j].bbox.y0 - y).abs() <= config.position_tolerance)
                .map(|&j| lines[j].page_number)
                .collect();
            if pages.len() >= threshold {
                mask[i] = true;
            }
        }
    }

    let flagged = mask.iter().filter(|&&m| m).count();
    log::debug!("noise filter: {} of {} lines flagged", flagged, lines.len());
    mask
}
