//! Headings and per-document outlines.

use serde::{Deserialize, Serialize};

use super::{BBox, DocumentId, LineLevel};

/// A logical heading: one or more merged heading lines on a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Owning document
    pub document_id: DocumentId,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Heading level (always one of Title/H1/H2/H3)
    pub level: LineLevel,
    /// Constituent line texts joined in reading order
    pub text: String,
    /// First and last classified-line index (inclusive)
    pub span: (usize, usize),
    /// Union of the constituent line boxes
    pub bbox: BBox,
    /// Font size of the first constituent line
    pub font_size: f32,
}

impl Heading {
    /// Number of lines merged into this heading.
    pub fn line_count(&self) -> usize {
        self.span.1 - self.span.0 + 1
    }
}

/// A heading placed in the outline tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// The heading (its level may have been flattened)
    pub heading: Heading,
    /// Index of the parent entry, if any
    pub parent: Option<usize>,
}

/// Per-document ordered outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Owning document
    pub document_id: DocumentId,
    /// Source filename
    pub filename: String,
    /// Total pages in the document
    pub page_count: u32,
    /// Entries in reading order
    pub entries: Vec<OutlineEntry>,
}

impl Outline {
    /// Create an empty outline.
    pub fn new(document_id: DocumentId, filename: impl Into<String>, page_count: u32) -> Self {
        Self {
            document_id,
            filename: filename.into(),
            page_count,
            entries: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate headings in reading order.
    pub fn headings(&self) -> impl Iterator<Item = &Heading> {
        self.entries.iter().map(|e| &e.heading)
    }

    /// Get a heading by outline index.
    pub fn heading(&self, index: usize) -> Option<&Heading> {
        self.entries.get(index).map(|e| &e.heading)
    }

    /// Indices of entries without a parent.
    pub fn roots(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.parent.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of the direct children of an entry.
    pub fn children(&self, index: usize) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.parent == Some(index))
            .map(|(i, _)| i)
            .collect()
    }

    /// Text of the first Title-level heading.
    pub fn title(&self) -> Option<&str> {
        self.headings()
            .find(|h| h.level == LineLevel::Title)
            .map(|h| h.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(level: LineLevel, text: &str, page: u32) -> Heading {
        Heading {
            document_id: DocumentId(0),
            page_number: page,
            level,
            text: text.to_string(),
            span: (0, 0),
            bbox: BBox::default(),
            font_size: 14.0,
        }
    }

    #[test]
    fn test_outline_tree_navigation() {
        let mut outline = Outline::new(DocumentId(0), "guide.pdf", 3);
        outline.entries.push(OutlineEntry {
            heading: heading(LineLevel::Title, "Guide", 1),
            parent: None,
        });
        outline.entries.push(OutlineEntry {
            heading: heading(LineLevel::H1, "Cities", 1),
            parent: Some(0),
        });
        outline.entries.push(OutlineEntry {
            heading: heading(LineLevel::H1, "Food", 2),
            parent: Some(0),
        });

        assert_eq!(outline.roots(), vec![0]);
        assert_eq!(outline.children(0), vec![1, 2]);
        assert_eq!(outline.title(), Some("Guide"));
        assert_eq!(outline.heading(2).map(|h| h.page_number), Some(2));
    }
}
