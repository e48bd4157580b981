//! End-to-end analysis: extraction, structure, ranking, summaries, report.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::extract::{ExtractedDocument, LineExtractor, PdfLineExtractor};
use crate::model::{AnalysisRequest, DocumentId, Outline, Report};
use crate::rank::{Embedder, HashingEmbedder, RelevanceRanker, SubsectionSummarizer};
use crate::render::ReportBuilder;
use crate::structure::{analyze_document, DocumentAnalysis};

/// A non-fatal problem with one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentWarning {
    /// The document could not be read; it contributes no headings.
    ReadFailed {
        document_id: DocumentId,
        filename: String,
        reason: String,
    },
    /// The document was read but no headings were detected.
    EmptyOutline {
        document_id: DocumentId,
        filename: String,
    },
}

impl DocumentWarning {
    pub fn document_id(&self) -> DocumentId {
        match self {
            DocumentWarning::ReadFailed { document_id, .. }
            | DocumentWarning::EmptyOutline { document_id, .. } => *document_id,
        }
    }
}

impl fmt::Display for DocumentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentWarning::ReadFailed {
                filename, reason, ..
            } => write!(f, "{}: skipped ({})", filename, reason),
            DocumentWarning::EmptyOutline { filename, .. } => {
                write!(f, "{}: no headings detected", filename)
            }
        }
    }
}

/// Result of a run: the report plus per-document warnings.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: Report,
    pub warnings: Vec<DocumentWarning>,
    /// Outlines of the documents that were read, in input order
    pub outlines: Vec<Outline>,
}

/// Runs the full pipeline over a request.
///
/// # Example
///
/// ```no_run
/// use sectionrank::{AnalysisConfig, AnalysisRequest, Analyzer};
///
/// let request = AnalysisRequest::from_file("collection/input.json")?;
/// let outcome = Analyzer::new()
///     .with_config(AnalysisConfig::new().with_top_k(5))
///     .analyze(&request, "collection/PDFs")?;
/// println!("{}", outcome.report.extracted_sections.len());
/// # Ok::<(), sectionrank::Error>(())
/// ```
#[derive(Clone)]
pub struct Analyzer {
    extractor: Arc<dyn LineExtractor>,
    embedder: Arc<dyn Embedder>,
    config: AnalysisConfig,
    timestamp: Option<String>,
}

impl Analyzer {
    /// PDF extraction with the hashing embedder and default configuration.
    pub fn new() -> Self {
        Self {
            extractor: Arc::new(PdfLineExtractor::new()),
            embedder: Arc::new(HashingEmbedder::new()),
            config: AnalysisConfig::default(),
            timestamp: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn LineExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a fixed report timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse the request's documents, resolved against `pdf_dir`.
    pub fn analyze<P: AsRef<Path>>(&self, request: &AnalysisRequest, pdf_dir: P) -> Result<AnalysisOutcome> {
        request.validate()?;
        self.config.validate()?;
        let pdf_dir = pdf_dir.as_ref();

        let extract = |(i, doc): (usize, &crate::model::DocumentRef)| {
            let path = pdf_dir.join(&doc.filename);
            log::debug!("extracting {}", path.display());
            self.extractor
                .extract(&path, DocumentId(i))
                .map(|extracted| analyze_document(&extracted, &self.config))
        };
        let results: Vec<Result<DocumentAnalysis>> = if self.config.parallel {
            request.documents.par_iter().enumerate().map(extract).collect()
        } else {
            request.documents.iter().enumerate().map(extract).collect()
        };

        self.finish(request, results)
    }

    /// Analyse already extracted documents.
    ///
    /// `documents[i]` belongs to `request.documents[i]`; an `Err` entry is
    /// treated like a document that failed to read.
    pub fn analyze_extracted(
        &self,
        request: &AnalysisRequest,
        documents: Vec<Result<ExtractedDocument>>,
    ) -> Result<AnalysisOutcome> {
        request.validate()?;
        self.config.validate()?;

        if documents.len() != request.documents.len() {
            return Err(Error::InvalidRequest(format!(
                "request lists {} document(s) but {} were supplied",
                request.documents.len(),
                documents.len()
            )));
        }
        for (i, doc) in documents.iter().enumerate() {
            if let Ok(doc) = doc {
                if doc.document_id != DocumentId(i) {
                    return Err(Error::InvalidRequest(format!(
                        "document at position {} carries id {}",
                        i, doc.document_id
                    )));
                }
            }
        }

        let analyze = |doc: Result<ExtractedDocument>| doc.map(|d| analyze_document(&d, &self.config));
        let results: Vec<Result<DocumentAnalysis>> = if self.config.parallel {
            documents.into_par_iter().map(analyze).collect()
        } else {
            documents.into_iter().map(analyze).collect()
        };

        self.finish(request, results)
    }

    /// Extract and structure a single PDF.
    pub fn outline<P: AsRef<Path>>(&self, path: P) -> Result<Outline> {
        let extracted = self.extractor.extract(path.as_ref(), DocumentId(0))?;
        Ok(analyze_document(&extracted, &self.config).outline)
    }

    /// Rank, summarize and report over per-document results.
    fn finish(
        &self,
        request: &AnalysisRequest,
        results: Vec<Result<DocumentAnalysis>>,
    ) -> Result<AnalysisOutcome> {
        let mut analyses = Vec::with_capacity(results.len());
        let mut warnings = Vec::new();

        for (i, result) in results.into_iter().enumerate() {
            let document_id = DocumentId(i);
            let filename = request
                .documents
                .get(i)
                .map(|d| d.filename.clone())
                .unwrap_or_else(|| document_id.to_string());
            match result {
                Ok(analysis) => {
                    if analysis.outline.is_empty() {
                        log::warn!("{}: no headings detected", filename);
                        warnings.push(DocumentWarning::EmptyOutline {
                            document_id,
                            filename,
                        });
                    }
                    analyses.push(analysis);
                }
                Err(e) if e.is_document_level() => {
                    log::warn!("{}: skipped: {}", filename, e);
                    warnings.push(DocumentWarning::ReadFailed {
                        document_id,
                        filename,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let query = request.query();
        log::info!(
            "ranking {} document(s) for query '{}'",
            analyses.len(),
            query
        );
        let ranked = RelevanceRanker::new(self.embedder.as_ref(), &self.config.rank).rank(&query, &analyses)?;
        let summaries = SubsectionSummarizer::new(&self.config.summary).summarize(&ranked, &analyses)?;

        let outlines: Vec<&Outline> = analyses.iter().map(|a| &a.outline).collect();
        let mut builder = ReportBuilder::new(request);
        if let Some(ts) = &self.timestamp {
            builder = builder.with_timestamp(ts.clone());
        }
        let report = builder.build(&ranked, &summaries, &outlines)?;

        Ok(AnalysisOutcome {
            report,
            warnings,
            outlines: analyses.into_iter().map(|a| a.outline).collect(),
        })
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("embedder", &self.embedder.name())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, DocumentRef, RawLine};

    fn doc(id: usize, sections: &[(&str, &str)]) -> ExtractedDocument {
        let mut lines = Vec::new();
        let mut y = 72.0;
        for (title, body) in sections {
            lines.push(
                RawLine::new(DocumentId(id), 1, *title, BBox::new(72.0, y, 300.0, y + 18.0), 18.0)
                    .with_bold(true),
            );
            y += 24.0;
            for _ in 0..3 {
                lines.push(RawLine::new(DocumentId(id), 1, *body, BBox::new(72.0, y, 500.0, y + 11.0), 11.0));
                y += 13.0;
            }
            y += 20.0;
        }
        ExtractedDocument::new(DocumentId(id), format!("d{id}.pdf"), 1, lines)
    }

    fn request(n: usize) -> AnalysisRequest {
        AnalysisRequest::new(
            "Food critic",
            "Find restaurants",
            (0..n).map(|i| DocumentRef::new(format!("d{i}.pdf"), "")).collect(),
        )
    }

    #[test]
    fn test_failed_document_becomes_warning() {
        let analyzer = Analyzer::new().with_timestamp("t");
        let outcome = analyzer
            .analyze_extracted(
                &request(2),
                vec![
                    Ok(doc(0, &[("Restaurants", "Great restaurants serve fresh fish daily.")])),
                    Err(Error::Encrypted),
                ],
            )
            .unwrap();

        assert_eq!(outcome.report.metadata.input_documents, vec!["d0.pdf", "d1.pdf"]);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(matches!(
            outcome.warnings[0],
            DocumentWarning::ReadFailed { document_id: DocumentId(1), .. }
        ));
        assert_eq!(outcome.report.extracted_sections.len(), 1);
    }

    #[test]
    fn test_non_document_error_is_fatal() {
        let result = Analyzer::new().analyze_extracted(
            &request(1),
            vec![Err(Error::Embedding("boom".into()))],
        );
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[test]
    fn test_mismatched_document_id_rejected() {
        let result = Analyzer::new().analyze_extracted(&request(1), vec![Ok(doc(3, &[]))]);
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_document_count_mismatch_rejected() {
        let short = Analyzer::new().analyze_extracted(&request(3), vec![Ok(doc(0, &[])), Ok(doc(1, &[]))]);
        assert!(matches!(short, Err(Error::InvalidRequest(_))));

        let long = Analyzer::new().analyze_extracted(&request(1), vec![Ok(doc(0, &[])), Ok(doc(1, &[]))]);
        assert!(matches!(long, Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_empty_outline_warning() {
        let lines = vec![RawLine::new(
            DocumentId(0),
            1,
            "just one plain line of text",
            BBox::new(72.0, 72.0, 300.0, 83.0),
            11.0,
        )];
        let outcome = Analyzer::new()
            .analyze_extracted(&request(1), vec![Ok(ExtractedDocument::new(DocumentId(0), "d0.pdf", 1, lines))])
            .unwrap();
        assert!(matches!(outcome.warnings[0], DocumentWarning::EmptyOutline { .. }));
        assert!(outcome.report.extracted_sections.is_empty());
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = Analyzer::new()
            .with_config(AnalysisConfig::new().sequential())
            .analyze(&request(2), dir.path())
            .unwrap();
        assert_eq!(outcome.warnings.len(), 2);
        assert!(outcome.report.extracted_sections.is_empty());
        assert_eq!(outcome.report.metadata.input_documents.len(), 2);
    }
}
