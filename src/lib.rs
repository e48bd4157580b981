//! # sectionrank
//!
//! Persona-driven section extraction for PDF collections.
//!
//! The library detects the outline of each PDF (title and H1–H3 headings,
//! with running headers, footers and page numbers filtered out), ranks the
//! headings of a whole collection by relevance to a persona and a task, and
//! writes a JSON report with a short summary for every selected section.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sectionrank::{analyze_collection, render, JsonFormat};
//!
//! fn main() -> sectionrank::Result<()> {
//!     let report = analyze_collection("collection/input.json", "collection/PDFs")?;
//!     println!("{}", render::report_json(&report, JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! Line extraction → noise filter → heading classifier → heading merger →
//! outline assembler → relevance ranker → subsection summarizer → report.
//!
//! - **Pluggable collaborators**: [`LineExtractor`] and [`Embedder`] are
//!   traits; the defaults are a lopdf-based extractor and a deterministic
//!   hashing embedder (`local-embeddings` adds all-MiniLM-L6-v2)
//! - **Parallel processing**: documents are analysed on Rayon's pool
//! - **Degraded runs**: unreadable documents become warnings, not failures

pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod rank;
pub mod render;
pub mod structure;
pub mod text;

// Re-export commonly used types
pub use config::{
    AnalysisConfig, ClassifierConfig, MergeConfig, NoiseConfig, RankConfig, SummaryConfig,
};
pub use error::{Error, Result};
pub use extract::{ExtractedDocument, LineExtractor, PdfLineExtractor};
pub use model::{
    AnalysisRequest, BBox, ClassifiedLine, DocumentId, DocumentRef, Heading, JobToBeDone,
    LineLevel, Outline, OutlineEntry, Persona, RankedSection, RawLine, Report,
    SubsectionSummary,
};
pub use pipeline::{AnalysisOutcome, Analyzer, DocumentWarning};
pub use rank::{Embedder, HashingEmbedder};
#[cfg(feature = "local-embeddings")]
pub use rank::MiniLmEmbedder;
pub use render::JsonFormat;
pub use structure::DocumentAnalysis;

use std::path::Path;

/// Analyse a collection described by an input JSON file.
///
/// # Arguments
///
/// * `input` - Path to the request JSON (persona, job, documents)
/// * `pdf_dir` - Directory holding the listed PDF files
///
/// # Example
///
/// ```no_run
/// use sectionrank::analyze_collection;
///
/// let report = analyze_collection("input.json", "PDFs").unwrap();
/// for section in &report.extracted_sections {
///     println!("{}. {}", section.importance_rank, section.section_title);
/// }
/// ```
pub fn analyze_collection<P: AsRef<Path>, Q: AsRef<Path>>(input: P, pdf_dir: Q) -> Result<Report> {
    let request = AnalysisRequest::from_file(input)?;
    Ok(Analyzer::new().analyze(&request, pdf_dir)?.report)
}

/// Analyse a collection with custom options.
pub fn analyze_collection_with_config<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    pdf_dir: Q,
    config: AnalysisConfig,
) -> Result<AnalysisOutcome> {
    let request = AnalysisRequest::from_file(input)?;
    Analyzer::new().with_config(config).analyze(&request, pdf_dir)
}

/// Detect the outline of a single PDF file.
///
/// # Example
///
/// ```no_run
/// use sectionrank::extract_outline;
///
/// let outline = extract_outline("document.pdf").unwrap();
/// for heading in outline.headings() {
///     println!("{} {} (p. {})", heading.level, heading.text, heading.page_number);
/// }
/// ```
pub fn extract_outline<P: AsRef<Path>>(path: P) -> Result<Outline> {
    Analyzer::new().outline(path)
}

/// Detect the outline of a PDF and render it as JSON.
pub fn outline_to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let outline = extract_outline(path)?;
    render::outline_json(&outline, None, format)
}
