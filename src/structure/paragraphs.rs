//! Grouping of body lines into paragraphs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::SummaryConfig;
use crate::model::{BBox, ClassifiedLine, DocumentId};
use crate::text::normalize;

/// Font size change (points) that starts a new paragraph.
const FONT_SIZE_BREAK: f32 = 1.0;

/// Consecutive body lines of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyParagraph {
    pub document_id: DocumentId,
    pub page_number: u32,
    /// Normalized paragraph text
    pub text: String,
    /// First and last classified-line index (inclusive)
    pub span: (usize, usize),
    pub bbox: BBox,
}

impl BodyParagraph {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Mean top-to-top distance between consecutive body lines, per page.
fn average_spacing(lines: &[ClassifiedLine]) -> HashMap<u32, f32> {
    let mut sums: HashMap<u32, (f32, usize)> = HashMap::new();
    let mut prev: Option<&ClassifiedLine> = None;
    for line in lines.iter().filter(|l| l.is_body()) {
        if let Some(p) = prev.filter(|p| p.line.page_number == line.line.page_number) {
            let spacing = line.line.bbox.y0 - p.line.bbox.y0;
            if spacing > 0.0 {
                let entry = sums.entry(line.line.page_number).or_default();
                entry.0 += spacing;
                entry.1 += 1;
            }
        }
        prev = Some(line);
    }
    sums.into_iter()
        .map(|(page, (sum, n))| (page, sum / n as f32))
        .collect()
}

/// Determine if `curr` starts a new paragraph after `prev`.
fn should_break(prev: &ClassifiedLine, curr: &ClassifiedLine, avg_spacing: f32, config: &SummaryConfig) -> bool {
    if prev.line.page_number != curr.line.page_number {
        return true;
    }

    // Large spacing indicates new paragraph
    let spacing = curr.line.bbox.y0 - prev.line.bbox.y0;
    if avg_spacing > 0.0 && spacing > avg_spacing * config.paragraph_gap_ratio {
        return true;
    }

    if (prev.line.font_size - curr.line.font_size).abs() > FONT_SIZE_BREAK {
        return true;
    }

    // Significant left margin change (indentation)
    (prev.line.bbox.x0 - curr.line.bbox.x0).abs() > config.indent_shift
}

/// Group body lines into paragraphs.
///
/// Headings end a paragraph; noise lines are skipped without breaking one,
/// so a page footer does not split text that continues around it.
pub fn group_paragraphs(lines: &[ClassifiedLine], config: &SummaryConfig) -> Vec<BodyParagraph> {
    let spacing = average_spacing(lines);
    let mut paragraphs = Vec::new();
    let mut current: Vec<usize> = Vec::new();

    let flush = |current: &mut Vec<usize>, paragraphs: &mut Vec<BodyParagraph>| {
        if let (Some(&first), Some(&last)) = (current.first(), current.last()) {
            let joined = current
                .iter()
                .map(|&i| lines[i].line.text.trim())
                .collect::<Vec<_>>()
                .join(" ");
            let text = normalize(&joined);
            if !text.is_empty() {
                let bbox = current
                    .iter()
                    .map(|&i| lines[i].line.bbox)
                    .reduce(|a, b| a.union(&b))
                    .unwrap_or_default();
                paragraphs.push(BodyParagraph {
                    document_id: lines[first].line.document_id,
                    page_number: lines[first].line.page_number,
                    text,
                    span: (first, last),
                    bbox,
                });
            }
        }
        current.clear();
    };

    for (i, line) in lines.iter().enumerate() {
        if line.is_noise() {
            continue;
        }
        if line.is_heading() {
            flush(&mut current, &mut paragraphs);
            continue;
        }
        if let Some(&prev) = current.last() {
            let avg = spacing.get(&line.line.page_number).copied().unwrap_or(0.0);
            if should_break(&lines[prev], line, avg, config) {
                flush(&mut current, &mut paragraphs);
            }
        }
        current.push(i);
    }
    flush(&mut current, &mut paragraphs);

    paragraphs
}
