//! JSON rendering for reports and outlines.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Outline, Report};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any value in the given format.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Render an analysis report.
pub fn report_json(report: &Report, format: JsonFormat) -> Result<String> {
    to_json(report, format)
}

/// One `outline` row of the outline export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineItem {
    pub level: String,
    pub text: String,
    pub page: u32,
}

/// Outline export: `{"title": ..., "outline": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineDocument {
    pub title: String,
    pub outline: Vec<OutlineItem>,
}

impl OutlineDocument {
    /// Build the export form. The title is the first Title-level heading,
    /// else `fallback_title`, else empty.
    pub fn from_outline(outline: &Outline, fallback_title: Option<&str>) -> Self {
        let title = outline
            .title()
            .or(fallback_title)
            .unwrap_or_default()
            .to_string();
        Self {
            title,
            outline: outline
                .headings()
                .map(|h| OutlineItem {
                    level: h.level.as_str().to_string(),
                    text: h.text.clone(),
                    page: h.page_number,
                })
                .collect(),
        }
    }
}

/// Render one document's outline.
pub fn outline_json(outline: &Outline, fallback_title: Option<&str>, format: JsonFormat) -> Result<String> {
    to_json(&OutlineDocument::from_outline(outline, fallback_title), format)
}
