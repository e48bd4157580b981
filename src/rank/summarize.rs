//! Subsection summaries for ranked sections.
//!
//! Each summary is the longest run of whole sentences that fits the
//! character budget. Summaries are accepted one at a time, and a candidate
//! too similar to any accepted summary is replaced by an alternative taken
//! from the same source.

use std::collections::{HashMap, HashSet};

use crate::config::SummaryConfig;
use crate::error::{Error, Result};
use crate::model::{DocumentId, Heading, RankedSection, SubsectionSummary};
use crate::structure::DocumentAnalysis;
use crate::text::{normalize, overlap_similarity, split_sentences};

/// Longest group of consecutive sentences starting at `start` that fits in
/// `budget` characters. The first sentence is always included.
fn sentence_group(sentences: &[&str], start: usize, budget: usize) -> String {
    let mut group = String::new();
    for sentence in &sentences[start..] {
        let added = if group.is_empty() {
            sentence.chars().count()
        } else {
            group.chars().count() + 1 + sentence.chars().count()
        };
        if !group.is_empty() && added > budget {
            break;
        }
        if !group.is_empty() {
            group.push(' ');
        }
        group.push_str(sentence);
    }
    group
}

/// Candidate summaries in preference order.
fn candidates(source: &str, heading_text: &str, budget: usize) -> Vec<String> {
    let text = normalize(source);
    let sentences = split_sentences(&text);
    let mut out: Vec<String> = Vec::new();

    if !sentences.is_empty() {
        out.push(sentence_group(&sentences, 0, budget));

        let mut groups: Vec<String> = (1..sentences.len())
            .map(|start| sentence_group(&sentences, start, budget))
            .collect();
        groups.sort_by_key(|g| std::cmp::Reverse(g.chars().count()));
        out.extend(groups);

        let mut singles: Vec<&str> = sentences.clone();
        singles.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
        out.extend(singles.into_iter().map(str::to_string));
    }
    out.push(normalize(heading_text));

    let mut seen = HashSet::new();
    out.retain(|c| !c.is_empty() && seen.insert(c.clone()));
    out
}

/// Builds one [`SubsectionSummary`] per ranked section.
pub struct SubsectionSummarizer<'a> {
    config: &'a SummaryConfig,
}

impl<'a> SubsectionSummarizer<'a> {
    pub fn new(config: &'a SummaryConfig) -> Self {
        Self { config }
    }

    /// Source text for a heading: the paragraph after it, else the largest
    /// paragraph on its page, else the heading itself.
    pub fn source_text<'d>(&self, analysis: &'d DocumentAnalysis, heading: &'d Heading) -> &'d str {
        analysis
            .following_paragraph(heading)
            .or_else(|| analysis.largest_paragraph(heading.page_number))
            .map_or(heading.text.as_str(), |p| p.text.as_str())
    }

    fn is_duplicate(&self, candidate: &str, accepted: &[SubsectionSummary]) -> bool {
        accepted
            .iter()
            .filter(|s| !s.refined_text.is_empty())
            .any(|s| overlap_similarity(candidate, &s.refined_text) >= self.config.duplicate_threshold)
    }

    /// Summarize `ranked` (in rank order) against the analysed documents.
    pub fn summarize(
        &self,
        ranked: &[RankedSection],
        analyses: &[DocumentAnalysis],
    ) -> Result<Vec<SubsectionSummary>> {
        let by_id: HashMap<DocumentId, &DocumentAnalysis> = analyses
            .iter()
            .map(|a| (a.outline.document_id, a))
            .collect();

        let mut accepted: Vec<SubsectionSummary> = Vec::with_capacity(ranked.len());
        for section in ranked {
            let analysis = by_id.get(&section.document_id).ok_or_else(|| {
                Error::Render(format!("ranked section refers to unknown {}", section.document_id))
            })?;
            let heading = analysis.outline.heading(section.heading_ref.index).ok_or_else(|| {
                Error::Render(format!(
                    "ranked section refers to unknown heading {} in {}",
                    section.heading_ref.index, section.document_id
                ))
            })?;

            let source = self.source_text(analysis, heading);
            let refined_text = candidates(source, &heading.text, self.config.target_chars)
                .into_iter()
                .find(|c| !self.is_duplicate(c, &accepted))
                .unwrap_or_else(|| {
                    log::warn!(
                        "no distinct summary for '{}' ({}, page {})",
                        heading.text,
                        analysis.outline.filename,
                        heading.page_number
                    );
                    String::new()
                });

            accepted.push(SubsectionSummary {
                document_id: section.document_id,
                page_number: heading.page_number,
                refined_text,
            });
        }

        Ok(accepted)
    }
}
