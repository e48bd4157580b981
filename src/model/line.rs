//! Line-level types: the extractor boundary and the classifier output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a document in the request's document list (0-based).
///
/// Ordering by `DocumentId` is input-list order, which is the first
/// tie-break key during ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub usize);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

/// Axis-aligned bounding box in points, top-left origin.
///
/// `y0` is the top edge and grows downward, so sorting by `y0` yields
/// top-to-bottom reading order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    /// Create a new bounding box.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// A text line as produced by a [`crate::extract::LineExtractor`].
///
/// This is the only representation of extractor output the analysis
/// stages depend on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLine {
    /// Owning document
    pub document_id: DocumentId,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Line text
    pub text: String,
    /// Bounding box on the page
    pub bbox: BBox,
    /// Average font size in points (weighted by character count)
    pub font_size: f32,
    /// Whether the line is predominantly set in a bold face
    pub is_bold: bool,
    /// Dominant font name (e.g., "Helvetica-Bold")
    pub font_name: String,
}

impl RawLine {
    /// Create a regular-weight line.
    pub fn new(
        document_id: DocumentId,
        page_number: u32,
        text: impl Into<String>,
        bbox: BBox,
        font_size: f32,
    ) -> Self {
        Self {
            document_id,
            page_number,
            text: text.into(),
            bbox,
            font_size,
            is_bold: false,
            font_name: String::new(),
        }
    }

    /// Set the bold flag.
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.is_bold = bold;
        self
    }

    /// Set the font name.
    pub fn with_font_name(mut self, name: impl Into<String>) -> Self {
        self.font_name = name.into();
        self
    }

    /// Character count of the trimmed text.
    pub fn char_count(&self) -> usize {
        self.text.trim().chars().count()
    }
}

/// Structural level assigned to a line.
///
/// The heading variants are ordered from shallowest to deepest, so
/// `Title < H1 < H2 < H3` compares nesting depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LineLevel {
    Title,
    H1,
    H2,
    H3,
    Body,
    Noise,
}

impl LineLevel {
    /// All heading levels, shallowest first.
    pub const HEADINGS: [LineLevel; 4] = [LineLevel::Title, LineLevel::H1, LineLevel::H2, LineLevel::H3];

    /// Check if this level is a heading level.
    pub fn is_heading(self) -> bool {
        self.depth().is_some()
    }

    /// Nesting depth of a heading level (Title = 0 .. H3 = 3).
    pub fn depth(self) -> Option<usize> {
        match self {
            LineLevel::Title => Some(0),
            LineLevel::H1 => Some(1),
            LineLevel::H2 => Some(2),
            LineLevel::H3 => Some(3),
            LineLevel::Body | LineLevel::Noise => None,
        }
    }

    /// Heading level for a depth; depths past H3 collapse to H3.
    pub fn from_depth(depth: usize) -> LineLevel {
        Self::HEADINGS[depth.min(Self::HEADINGS.len() - 1)]
    }

    /// Label used in JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            LineLevel::Title => "Title",
            LineLevel::H1 => "H1",
            LineLevel::H2 => "H2",
            LineLevel::H3 => "H3",
            LineLevel::Body => "Body",
            LineLevel::Noise => "Noise",
        }
    }
}

impl fmt::Display for LineLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A [`RawLine`] with its assigned level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedLine {
    /// The source line
    pub line: RawLine,
    /// Assigned level
    pub level: LineLevel,
    /// Classifier confidence in `[0, 1]`
    pub confidence: f32,
}

impl ClassifiedLine {
    pub fn new(line: RawLine, level: LineLevel, confidence: f32) -> Self {
        Self {
            line,
            level,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn is_heading(&self) -> bool {
        self.level.is_heading()
    }

    pub fn is_body(&self) -> bool {
        self.level == LineLevel::Body
    }

    pub fn is_noise(&self) -> bool {
        self.level == LineLevel::Noise
    }
}
