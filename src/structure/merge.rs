//! Merging of wrapped heading lines into logical headings.

use crate::config::MergeConfig;
use crate::model::{ClassifiedLine, Heading};

/// Whether `next` continues the heading whose last line is `prev`.
///
/// The caller guarantees the two lines are adjacent in reading order.
fn continues(prev: &ClassifiedLine, next: &ClassifiedLine, config: &MergeConfig) -> bool {
    if prev.level != next.level || prev.line.page_number != next.line.page_number {
        return false;
    }
    let gap = next.line.bbox.y0 - prev.line.bbox.y1;
    let height = prev.line.bbox.height();
    gap <= config.gap_multiple * height
        && (prev.line.font_size - next.line.font_size).abs() <= config.font_tolerance
}

/// Group heading lines into [`Heading`]s.
///
/// `lines` must be one document in reading order. Body and noise lines
/// break a run, so only directly adjacent heading lines merge.
pub fn merge_headings(lines: &[ClassifiedLine], config: &MergeConfig) -> Vec<Heading> {
    let mut headings: Vec<Heading> = Vec::new();
    let mut open = false;

    for (i, line) in lines.iter().enumerate() {
        if !line.is_heading() {
            open = false;
            continue;
        }

        if open && continues(&lines[i - 1], line, config) {
            if let Some(current) = headings.last_mut() {
                current.text.push(' ');
                current.text.push_str(line.line.text.trim());
                current.span.1 = i;
                current.bbox = current.bbox.union(&line.line.bbox);
                continue;
            }
        }

        headings.push(Heading {
            document_id: line.line.document_id,
            page_number: line.line.page_number,
            level: line.level,
            text: line.line.text.trim().to_string(),
            span: (i, i),
            bbox: line.line.bbox,
            font_size: line.line.font_size,
        });
        open = true;
    }

    headings
}
