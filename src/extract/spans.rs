//! Content-stream interpretation: text operators to positioned spans.

use std::collections::HashMap;

use super::backend::{ContentOp, PageId, PdfBackend, PdfValue};
use crate::error::Result;

/// TJ adjustment (thousandths of an em) treated as a word break.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A text span with position and style information.
///
/// Coordinates are PDF user space: `y` is the baseline, growing upward.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated advance width
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    /// Whether the font appears to be bold
    pub is_bold: bool,
}

impl TextSpan {
    /// Create a new text span; bold is inferred from the font name.
    pub fn new(text: String, x: f32, y: f32, font_size: f32, font_name: String) -> Self {
        let is_bold = is_bold_font_name(&font_name);
        // No glyph widths available: assume half an em per character.
        let width = text.chars().count() as f32 * font_size * 0.5;
        Self {
            text,
            x,
            y,
            width,
            font_size,
            font_name,
            is_bold,
        }
    }

    /// Top edge in user space (approximate ascender).
    pub fn top(&self) -> f32 {
        self.y + self.font_size * 0.8
    }

    /// Bottom edge in user space (approximate descender).
    pub fn bottom(&self) -> f32 {
        self.y - self.font_size * 0.2
    }
}

/// Bold detection from a PostScript font name.
pub fn is_bold_font_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    ["bold", "black", "heavy", "semibold", "demi"]
        .iter()
        .any(|marker| lower.contains(marker))
}

/// Text matrix state tracked across text operators.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    // Start of the current line (Td/TD/T* are relative to it)
    line_e: f32,
    line_f: f32,
    leading: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            line_e: 0.0,
            line_f: 0.0,
            leading: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
        self.line_e = e;
        self.line_f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_e += tx * self.a + ty * self.c;
        self.line_f += tx * self.b + ty * self.d;
        self.e = self.line_e;
        self.f = self.line_f;
    }

    fn next_line(&mut self, font_size: f32) {
        let leading = if self.leading > 0.0 {
            self.leading
        } else {
            font_size * 1.2
        };
        self.translate(0.0, -leading);
    }

    /// Move the pen after showing `chars` glyphs.
    fn advance(&mut self, chars: usize, font_size: f32) {
        self.e += chars as f32 * font_size * 0.5 * self.a;
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

/// Interpret one page's content stream into text spans.
pub fn extract_page_spans<B: PdfBackend + ?Sized>(backend: &B, page: PageId) -> Result<Vec<TextSpan>> {
    let fonts: HashMap<Vec<u8>, String> = backend
        .page_fonts(page)?
        .into_iter()
        .map(|f| (f.name, f.base_font))
        .collect();
    let ops = backend.page_operations(page)?;
    Ok(interpret_operations(&ops, &fonts, |font, bytes| {
        backend.decode_text(page, font, bytes)
    }))
}

/// Interpret text operators.
///
/// `decode` maps (font resource name, raw string bytes) to text.
pub fn interpret_operations<F>(
    ops: &[ContentOp],
    fonts: &HashMap<Vec<u8>, String>,
    decode: F,
) -> Vec<TextSpan>
where
    F: Fn(&[u8], &[u8]) -> String,
{
    let mut spans = Vec::new();
    let mut font_resource: Vec<u8> = Vec::new();
    let mut font_name = String::new();
    let mut font_size: f32 = 12.0;
    let mut matrix = TextMatrix::default();
    let mut in_text = false;

    for op in ops {
        match op.operator.as_str() {
            "BT" => {
                in_text = true;
                let leading = matrix.leading;
                matrix = TextMatrix::default();
                matrix.leading = leading;
            }
            "ET" => in_text = false,
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    font_resource = name.clone();
                    font_name = fonts
                        .get(name)
                        .cloned()
                        .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                }
                font_size = op.number(1).unwrap_or(12.0);
            }
            "TL" => matrix.leading = op.number(0).unwrap_or(0.0),
            "Td" => matrix.translate(op.number(0).unwrap_or(0.0), op.number(1).unwrap_or(0.0)),
            "TD" => {
                let ty = op.number(1).unwrap_or(0.0);
                matrix.leading = -ty;
                matrix.translate(op.number(0).unwrap_or(0.0), ty);
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    matrix.set(
                        op.number(0).unwrap_or(1.0),
                        op.number(1).unwrap_or(0.0),
                        op.number(2).unwrap_or(0.0),
                        op.number(3).unwrap_or(1.0),
                        op.number(4).unwrap_or(0.0),
                        op.number(5).unwrap_or(0.0),
                    );
                }
            }
            "T*" => matrix.next_line(font_size),
            "Tj" | "TJ" | "'" | "\"" if in_text => {
                if op.operator == "'" || op.operator == "\"" {
                    matrix.next_line(font_size);
                }
                let text = match op.operator.as_str() {
                    "TJ" => match op.operands.first() {
                        Some(PdfValue::Array(items)) => {
                            decode_tj_array(items, |bytes| decode(&font_resource, bytes))
                        }
                        _ => String::new(),
                    },
                    "\"" => string_operand(op.operands.get(2), |b| decode(&font_resource, b)),
                    _ => string_operand(op.operands.first(), |b| decode(&font_resource, b)),
                };

                let size = font_size * matrix.scale();
                let chars = text.chars().count();
                if !text.trim().is_empty() {
                    let (x, y) = matrix.position();
                    spans.push(TextSpan::new(text, x, y, size, font_name.clone()));
                }
                matrix.advance(chars, font_size);
            }
            _ => {}
        }
    }

    spans
}

fn string_operand<F: Fn(&[u8]) -> String>(value: Option<&PdfValue>, decode: F) -> String {
    match value {
        Some(PdfValue::Str(bytes)) => decode(bytes),
        _ => String::new(),
    }
}

/// Decode a TJ array; large negative adjustments become word spaces.
fn decode_tj_array<F: Fn(&[u8]) -> String>(items: &[PdfValue], decode: F) -> String {
    let mut combined = String::new();
    for item in items {
        match item {
            PdfValue::Str(bytes) => combined.push_str(&decode(bytes)),
            other => {
                let Some(n) = other.as_number() else { continue };
                if -n > TJ_SPACE_THRESHOLD
                    && !combined.is_empty()
                    && !combined.ends_with(' ')
                    && !combined.ends_with('\u{00A0}')
                    && !combined.chars().last().is_some_and(is_spaceless_script_char)
                {
                    combined.push(' ');
                }
            }
        }
    }
    combined
}

/// Check if character is from a script that doesn't use word spaces.
///
/// Chinese and Japanese don't use spaces between words, Korean does.
pub fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs + Extension A
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    // Extensions B-F
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}
