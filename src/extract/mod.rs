//! Line extraction: PDF pages to positioned text lines.
//!
//! [`LineExtractor`] is the boundary between PDF decoding and the
//! analysis stages. [`PdfLineExtractor`] implements it on top of
//! [`LopdfBackend`]: content streams are interpreted into spans
//! ([`spans`]) which are grouped into lines by baseline ([`lines`]).

mod backend;
mod lines;
mod spans;

use std::path::Path;

pub use backend::{
    decode_text_simple, BackendFontInfo, ContentOp, LopdfBackend, PageId, PdfBackend, PdfValue,
};
pub use lines::group_spans_into_lines;
pub use spans::{interpret_operations, is_bold_font_name, TextSpan};

use crate::error::{Error, Result};
use crate::model::{DocumentId, RawLine};

/// Lines of one document as produced by a [`LineExtractor`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    pub document_id: DocumentId,
    /// File name (no directory)
    pub filename: String,
    /// Total pages, including pages that produced no lines
    pub page_count: u32,
    /// Lines in reading order
    pub lines: Vec<RawLine>,
}

impl ExtractedDocument {
    /// Create an extracted document.
    pub fn new(
        document_id: DocumentId,
        filename: impl Into<String>,
        page_count: u32,
        lines: Vec<RawLine>,
    ) -> Self {
        Self {
            document_id,
            filename: filename.into(),
            page_count,
            lines,
        }
    }
}

/// Source of positioned text lines.
pub trait LineExtractor: Send + Sync {
    /// Extract every line of the document at `path`.
    fn extract(&self, path: &Path, document_id: DocumentId) -> Result<ExtractedDocument>;
}

/// [`LineExtractor`] for PDF files, backed by lopdf.
#[derive(Debug, Clone, Default)]
pub struct PdfLineExtractor {
    strict: bool,
}

impl PdfLineExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the whole document on the first unreadable page instead of
    /// skipping it.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Extract lines from an already loaded backend.
    pub fn extract_backend<B: PdfBackend + ?Sized>(
        &self,
        backend: &B,
        document_id: DocumentId,
        filename: &str,
    ) -> Result<ExtractedDocument> {
        let pages = backend.pages();
        let page_count = pages.len() as u32;
        let mut lines = Vec::new();

        for (page_number, page_id) in pages {
            if page_number == 0 || page_number > page_count {
                return Err(Error::PageOutOfRange(page_number, page_count));
            }
            let spans = match spans::extract_page_spans(backend, page_id) {
                Ok(spans) => spans,
                Err(e) if !self.strict => {
                    log::warn!("{}: skipping page {}: {}", filename, page_number, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let (_, height) = backend.page_size(page_id);
            lines.extend(group_spans_into_lines(spans, document_id, page_number, height));
        }

        log::debug!(
            "{}: {} lines from {} pages",
            filename,
            lines.len(),
            page_count
        );
        Ok(ExtractedDocument::new(document_id, filename, page_count, lines))
    }
}

impl LineExtractor for PdfLineExtractor {
    fn extract(&self, path: &Path, document_id: DocumentId) -> Result<ExtractedDocument> {
        let backend = LopdfBackend::load_file(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.extract_backend(&backend, document_id, &filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// In-memory backend: one content stream per page.
    struct MockBackend {
        pages: Vec<Result<Vec<ContentOp>>>,
    }

    impl PdfBackend for MockBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            (0..self.pages.len())
                .map(|i| (i as u32 + 1, (i as u32 + 10, 0)))
                .collect()
        }

        fn page_size(&self, _page: PageId) -> (f32, f32) {
            (612.0, 792.0)
        }

        fn page_fonts(&self, _page: PageId) -> Result<Vec<BackendFontInfo>> {
            Ok(vec![BackendFontInfo {
                name: b"F1".to_vec(),
                base_font: "Times-Bold".to_string(),
            }])
        }

        fn page_operations(&self, page: PageId) -> Result<Vec<ContentOp>> {
            match &self.pages[(page.0 - 10) as usize] {
                Ok(ops) => Ok(ops.clone()),
                Err(_) => Err(Error::Corrupted("bad stream".into())),
            }
        }

        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            decode_text_simple(bytes)
        }
    }

    fn page_with(text: &str) -> Vec<ContentOp> {
        vec![
            ContentOp::new("BT", vec![]),
            ContentOp::new("Tf", vec![PdfValue::Name(b"F1".to_vec()), PdfValue::Integer(16)]),
            ContentOp::new("Td", vec![PdfValue::Integer(72), PdfValue::Integer(700)]),
            ContentOp::new("Tj", vec![PdfValue::Str(text.as_bytes().to_vec())]),
            ContentOp::new("ET", vec![]),
        ]
    }

    #[test]
    fn test_extract_backend_pages() {
        let backend = MockBackend {
            pages: vec![Ok(page_with("Overview")), Ok(page_with("Details"))],
        };
        let doc = PdfLineExtractor::new()
            .extract_backend(&backend, DocumentId(1), "guide.pdf")
            .unwrap();

        assert_eq!(doc.page_count, 2);
        assert_eq!(doc.lines.len(), 2);
        assert_eq!(doc.lines[1].page_number, 2);
        assert_eq!(doc.lines[1].text, "Details");
        assert!(doc.lines[0].is_bold);
    }

    #[test]
    fn test_lenient_skips_bad_pages() {
        let backend = MockBackend {
            pages: vec![Err(Error::Corrupted(String::new())), Ok(page_with("Kept"))],
        };
        let doc = PdfLineExtractor::new()
            .extract_backend(&backend, DocumentId(0), "x.pdf")
            .unwrap();
        assert_eq!(doc.page_count, 2);
        assert_eq!(doc.lines.len(), 1);

        let strict = PdfLineExtractor::new().strict().extract_backend(&backend, DocumentId(0), "x.pdf");
        assert!(matches!(strict, Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = PdfLineExtractor::new().extract(Path::new("/no/such/file.pdf"), DocumentId(0));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_non_pdf_file_is_rejected() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a pdf at all").unwrap();
        let result = PdfLineExtractor::new().extract(file.path(), DocumentId(0));
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }
}
