//! Ranking results and the output report.

use serde::{Deserialize, Serialize};

use super::DocumentId;

/// Reference to a heading inside a document's outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeadingRef {
    pub document_id: DocumentId,
    /// Index into `Outline::entries`
    pub index: usize,
}

/// A heading selected by the relevance ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSection {
    pub document_id: DocumentId,
    pub heading_ref: HeadingRef,
    /// 1-based rank, unique within a ranking pass
    pub importance_rank: usize,
    /// Cosine similarity to the persona/job query
    pub similarity_score: f32,
}

/// Condensed text for one ranked section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsectionSummary {
    pub document_id: DocumentId,
    pub page_number: u32,
    pub refined_text: String,
}

/// Report metadata block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// All requested filenames in input order, including skipped ones
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    /// ISO-8601 timestamp
    pub processing_timestamp: String,
}

/// One `extracted_sections` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub section_title: String,
    pub importance_rank: usize,
    pub page_number: u32,
}

/// One `subsection_analysis` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub page_number: u32,
    pub refined_text: String,
}

/// The complete output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
}
