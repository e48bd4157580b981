//! Document structure detection.
//!
//! Turns one document's [`RawLine`]s into an [`Outline`]:
//!
//! 1. [`noise_mask`] flags running headers, footers and page numbers
//! 2. [`classify_lines`] assigns Title/H1/H2/H3/Body/Noise levels
//! 3. [`merge_headings`] joins wrapped heading lines
//! 4. [`assemble_outline`] orders, de-duplicates and flattens headings
//!
//! Body lines are grouped into paragraphs by [`group_paragraphs`] for the
//! ranking and summarization stages.

mod classify;
mod merge;
mod noise;
mod outline;
mod paragraphs;

use std::cmp::Ordering;

pub use classify::{classify_lines, DocumentContext, HeadingBand, HeadingClassifier, PageStats};
pub use merge::merge_headings;
pub use noise::{is_page_number, noise_mask};
pub use outline::assemble_outline;
pub use paragraphs::{group_paragraphs, BodyParagraph};

use crate::config::AnalysisConfig;
use crate::extract::ExtractedDocument;
use crate::model::{ClassifiedLine, Heading, Outline, RawLine};

/// Structure of one document.
#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
    pub outline: Outline,
    /// Classified lines in reading order; heading and paragraph spans
    /// index into this list
    pub lines: Vec<ClassifiedLine>,
    pub paragraphs: Vec<BodyParagraph>,
}

impl DocumentAnalysis {
    /// First paragraph after the heading on its page, before any further
    /// heading line.
    pub fn following_paragraph(&self, heading: &Heading) -> Option<&BodyParagraph> {
        let end = heading.span.1;
        let next_heading = self
            .lines
            .iter()
            .enumerate()
            .skip(end + 1)
            .find(|(_, l)| l.is_heading() || l.line.page_number != heading.page_number)
            .map_or(self.lines.len(), |(i, _)| i);

        self.paragraphs
            .iter()
            .find(|p| p.span.0 > end && p.span.0 < next_heading && p.page_number == heading.page_number)
    }

    /// Longest paragraph on a page; ties go to the earliest.
    pub fn largest_paragraph(&self, page_number: u32) -> Option<&BodyParagraph> {
        self.paragraphs
            .iter()
            .filter(|p| p.page_number == page_number)
            .fold(None, |best: Option<&BodyParagraph>, p| match best {
                Some(b) if b.char_count() >= p.char_count() => Some(b),
                _ => Some(p),
            })
    }
}

/// Sort lines into reading order: page, then top edge, then left edge.
pub fn reading_order(lines: &mut [RawLine]) {
    lines.sort_by(|a, b| {
        a.page_number
            .cmp(&b.page_number)
            .then_with(|| a.bbox.y0.partial_cmp(&b.bbox.y0).unwrap_or(Ordering::Equal))
            .then_with(|| a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal))
    });
}

/// Run the structure stages over one extracted document.
pub fn analyze_document(document: &ExtractedDocument, config: &AnalysisConfig) -> DocumentAnalysis {
    let mut raw = document.lines.clone();
    reading_order(&mut raw);

    let noise = noise_mask(&raw, document.page_count, &config.noise);
    let lines = classify_lines(&raw, &noise, document.page_count, &config.classifier);
    let headings = merge_headings(&lines, &config.merge);
    let outline = assemble_outline(
        headings,
        document.document_id,
        &document.filename,
        document.page_count,
    );
    let paragraphs = group_paragraphs(&lines, &config.summary);

    log::info!(
        "{}: {} heading(s), {} paragraph(s) over {} page(s)",
        document.filename,
        outline.len(),
        paragraphs.len(),
        document.page_count
    );

    DocumentAnalysis {
        outline,
        lines,
        paragraphs,
    }
}
