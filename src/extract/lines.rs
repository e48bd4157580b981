//! Grouping of positioned spans into text lines.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::spans::{is_spaceless_script_char, TextSpan};
use crate::model::{BBox, DocumentId, RawLine};

/// Spans whose baselines differ by less than this share of the font size
/// sit on the same line.
const BASELINE_TOLERANCE: f32 = 0.3;

/// Group one page's spans into [`RawLine`]s in reading order.
///
/// `page_height` converts PDF's bottom-up y axis into the top-left origin
/// used by [`BBox`].
pub fn group_spans_into_lines(
    spans: Vec<TextSpan>,
    document_id: DocumentId,
    page_number: u32,
    page_height: f32,
) -> Vec<RawLine> {
    if spans.is_empty() {
        return vec![];
    }

    // Sort spans by Y (descending, since PDF Y is bottom-up) then X
    let mut spans = spans;
    spans.sort_by(|a, b| match b.y.partial_cmp(&a.y).unwrap_or(Ordering::Equal) {
        Ordering::Equal => a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal),
        other => other,
    });

    let mut groups: Vec<Vec<TextSpan>> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let tolerance = span.font_size * BASELINE_TOLERANCE;
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
        .into_iter()
        .filter_map(|group| line_from_spans(group, document_id, page_number, page_height))
        .collect()
}

fn line_from_spans(
    mut spans: Vec<TextSpan>,
    document_id: DocumentId,
    page_number: u32,
    page_height: f32,
) -> Option<RawLine> {
    spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

    let text = join_spans(&spans);
    if text.trim().is_empty() {
        return None;
    }

    // Dominant font size (weighted by text length)
    let total_chars: usize = spans.iter().map(|s| s.text.chars().count()).sum();
    let font_size = if total_chars > 0 {
        spans
            .iter()
            .map(|s| s.font_size * s.text.chars().count() as f32)
            .sum::<f32>()
            / total_chars as f32
    } else {
        spans[0].font_size
    };

    let bold_chars: usize = spans
        .iter()
        .filter(|s| s.is_bold)
        .map(|s| s.text.chars().count())
        .sum();
    let is_bold = bold_chars * 2 > total_chars;

    let mut by_font: HashMap<&str, usize> = HashMap::new();
    for span in &spans {
        *by_font.entry(span.font_name.as_str()).or_default() += span.text.chars().count();
    }
    let font_name = by_font
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(name, _)| name.to_string())
        .unwrap_or_default();

    let x0 = spans.iter().map(|s| s.x).fold(f32::INFINITY, f32::min);
    let x1 = spans
        .iter()
        .map(|s| s.x + s.width)
        .fold(f32::NEG_INFINITY, f32::max);
    let top = spans.iter().map(TextSpan::top).fold(f32::NEG_INFINITY, f32::max);
    let bottom = spans
        .iter()
        .map(TextSpan::bottom)
        .fold(f32::INFINITY, f32::min);
    let bbox = BBox::new(x0, page_height - top, x1, page_height - bottom);

    Some(
        RawLine::new(document_id, page_number, text.trim(), bbox, font_size)
            .with_bold(is_bold)
            .with_font_name(font_name),
    )
}

/// Concatenate spans, inserting spaces where the horizontal gap suggests one.
fn join_spans(spans: &[TextSpan]) -> String {
    let mut result = String::new();

    for (i, span) in spans.iter().enumerate() {
        if i == 0 {
            result.push_str(&span.text);
            continue;
        }
        let prev = &spans[i - 1];
        let gap = span.x - (prev.x + prev.width);

        let char_count = span.text.chars().count();
        let avg_char_width = if char_count > 0 && span.width > 0.0 {
            span.width / char_count as f32
        } else {
            span.font_size * 0.5
        };

        let both_cjk = prev.text.chars().last().is_some_and(is_spaceless_script_char)
            && span.text.chars().next().is_some_and(is_spaceless_script_char);
        let has_space = prev.text.ends_with(char::is_whitespace)
            || span.text.starts_with(char::is_whitespace);

        if gap > avg_char_width * 0.2 && !both_cjk && !has_space {
            result.push(' ');
        }
        result.push_str(&span.text);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, y: f32, size: f32, font: &str) -> TextSpan {
        TextSpan::new(text.to_string(), x, y, size, font.to_string())
    }

    #[test]
    fn test_groups_by_baseline_in_reading_order() {
        let spans = vec![
            span("second line", 72.0, 700.0, 12.0, "Helvetica"),
            span("World", 140.0, 720.5, 12.0, "Helvetica"),
            span("Hello", 72.0, 720.0, 12.0, "Helvetica"),
        ];
        let lines = group_spans_into_lines(spans, DocumentId(0), 1, 792.0);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Hello World");
        assert_eq!(lines[1].text, "second line");
        assert!(lines[0].bbox.y0 < lines[1].bbox.y0);
    }

    #[test]
    fn test_bbox_uses_top_left_origin() {
        let lines = group_spans_into_lines(
            vec![span("Title", 72.0, 700.0, 20.0, "Helvetica-Bold")],
            DocumentId(3),
            2,
            792.0,
        );
        let line = &lines[0];
        assert_eq!(line.document_id, DocumentId(3));
        assert_eq!(line.page_number, 2);
        assert!((line.bbox.y0 - 76.0).abs() < 1e-3);
        assert!((line.bbox.y1 - 96.0).abs() < 1e-3);
        assert!(line.is_bold);
        assert_eq!(line.font_name, "Helvetica-Bold");
    }

    #[test]
    fn test_weighted_font_size_and_majority_bold() {
        let spans = vec![
            span("Bold", 72.0, 500.0, 14.0, "Arial-Bold"),
            span("regular words here", 120.0, 500.0, 10.0, "Arial"),
        ];
        let lines = group_spans_into_lines(spans, DocumentId(0), 1, 792.0);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].font_size < 12.0);
        assert!(!lines[0].is_bold);
        assert_eq!(lines[0].font_name, "Arial");
    }

    #[test]
    fn test_cjk_spans_join_without_space() {
        let spans = vec![
            span("東京", 72.0, 500.0, 12.0, "MS-Mincho"),
            span("大阪", 100.0, 500.0, 12.0, "MS-Mincho"),
        ];
        let lines = group_spans_into_lines(spans, DocumentId(0), 1, 792.0);
        assert_eq!(lines[0].text, "東京大阪");
    }
}
