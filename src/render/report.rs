//! Report assembly.

use std::collections::HashMap;

use chrono::Local;

use crate::error::{Error, Result};
use crate::model::{
    AnalysisRequest, DocumentId, ExtractedSection, Outline, RankedSection, Report, ReportMetadata,
    SubsectionAnalysis, SubsectionSummary,
};

/// ISO-8601 local time with microseconds, e.g. `2025-07-10T15:31:22.632389`.
pub fn processing_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Builds the output [`Report`] from ranking results.
#[derive(Debug, Clone)]
pub struct ReportBuilder<'a> {
    request: &'a AnalysisRequest,
    timestamp: Option<String>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(request: &'a AnalysisRequest) -> Self {
        Self {
            request,
            timestamp: None,
        }
    }

    /// Use a fixed timestamp instead of the current time.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    fn document_name(&self, id: DocumentId, outlines: &HashMap<DocumentId, &Outline>) -> String {
        self.request
            .documents
            .get(id.0)
            .map(|d| d.filename.clone())
            .or_else(|| outlines.get(&id).map(|o| o.filename.clone()))
            .unwrap_or_else(|| id.to_string())
    }

    /// Assemble the report. `summaries` must be parallel to `ranked`.
    pub fn build(
        &self,
        ranked: &[RankedSection],
        summaries: &[SubsectionSummary],
        outlines: &[&Outline],
    ) -> Result<Report> {
        if ranked.len() != summaries.len() {
            return Err(Error::Render(format!(
                "{} ranked sections but {} summaries",
                ranked.len(),
                summaries.len()
            )));
        }
        let by_id: HashMap<DocumentId, &Outline> =
            outlines.iter().map(|o| (o.document_id, *o)).collect();

        let mut extracted_sections = Vec::with_capacity(ranked.len());
        for section in ranked {
            let heading = by_id
                .get(&section.document_id)
                .and_then(|o| o.heading(section.heading_ref.index))
                .ok_or_else(|| {
                    Error::Render(format!(
                        "no heading {} in {}",
                        section.heading_ref.index, section.document_id
                    ))
                })?;
            extracted_sections.push(ExtractedSection {
                document: self.document_name(section.document_id, &by_id),
                section_title: heading.text.clone(),
                importance_rank: section.importance_rank,
                page_number: heading.page_number,
            });
        }

        let subsection_analysis = summaries
            .iter()
            .map(|s| SubsectionAnalysis {
                document: self.document_name(s.document_id, &by_id),
                page_number: s.page_number,
                refined_text: s.refined_text.clone(),
            })
            .collect();

        Ok(Report {
            metadata: ReportMetadata {
                input_documents: self.request.filenames(),
                persona: self.request.persona.role.clone(),
                job_to_be_done: self.request.job_to_be_done.task.clone(),
                processing_timestamp: self
                    .timestamp
                    .clone()
                    .unwrap_or_else(processing_timestamp),
            },
            extracted_sections,
            subsection_analysis,
        })
    }
}
