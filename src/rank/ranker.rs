//! Relevance ranking of outline headings against the persona/job query.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::embed::{validate_embeddings, Embedder};
use super::similarity::cosine_similarity;
use crate::config::RankConfig;
use crate::error::Result;
use crate::model::{DocumentId, Heading, HeadingRef, RankedSection};
use crate::structure::DocumentAnalysis;
use crate::text::{normalize, normalize_title, truncate_at_word};

/// Text embedded for a heading: its title plus the paragraph that follows.
pub fn heading_context(analysis: &DocumentAnalysis, heading: &Heading, max_chars: usize) -> String {
    let mut context = heading.text.clone();
    if let Some(paragraph) = analysis.following_paragraph(heading) {
        context.push(' ');
        context.push_str(&paragraph.text);
    }
    let context = normalize(&context);
    truncate_at_word(&context, max_chars).to_string()
}

#[derive(Debug, Clone)]
struct Candidate {
    heading_ref: HeadingRef,
    page_number: u32,
    title_key: String,
    score: f32,
}

impl Candidate {
    /// Descending score, then document order, page and outline position.
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.heading_ref.document_id.cmp(&other.heading_ref.document_id))
            .then_with(|| self.page_number.cmp(&other.page_number))
            .then_with(|| self.heading_ref.index.cmp(&other.heading_ref.index))
    }
}

/// Scores headings with one batched embedding call and selects the top
/// sections under the de-duplication and diversity rules.
pub struct RelevanceRanker<'a> {
    embedder: &'a dyn Embedder,
    config: &'a RankConfig,
}

impl<'a> RelevanceRanker<'a> {
    pub fn new(embedder: &'a dyn Embedder, config: &'a RankConfig) -> Self {
        Self { embedder, config }
    }

    /// Rank the headings of all documents against `query`.
    pub fn rank(&self, query: &str, analyses: &[DocumentAnalysis]) -> Result<Vec<RankedSection>> {
        let mut candidates = Vec::new();
        let mut texts = vec![query.trim().to_string()];

        for analysis in analyses {
            let document_id = analysis.outline.document_id;
            for (index, heading) in analysis.outline.headings().enumerate() {
                texts.push(heading_context(analysis, heading, self.config.context_chars));
                candidates.push(Candidate {
                    heading_ref: HeadingRef { document_id, index },
                    page_number: heading.page_number,
                    title_key: normalize_title(&heading.text),
                    score: 0.0,
                });
            }
        }

        if candidates.is_empty() {
            log::warn!("no headings to rank");
            return Ok(Vec::new());
        }

        log::debug!(
            "embedding query and {} heading context(s) with {}",
            candidates.len(),
            self.embedder.name()
        );
        let vectors = self.embedder.embed_batch(&texts)?;
        validate_embeddings(texts.len(), &vectors)?;

        let query_vector = &vectors[0];
        for (candidate, vector) in candidates.iter_mut().zip(&vectors[1..]) {
            candidate.score = cosine_similarity(query_vector, vector);
        }
        candidates.sort_by(Candidate::rank_cmp);

        let selected = self.select(&candidates);
        Ok(selected
            .into_iter()
            .enumerate()
            .map(|(i, c)| RankedSection {
                document_id: c.heading_ref.document_id,
                heading_ref: c.heading_ref,
                importance_rank: i + 1,
                similarity_score: c.score,
            })
            .collect())
    }

    /// Pick up to `top_k` candidates from a ranked list.
    fn select<'c>(&self, ranked: &'c [Candidate]) -> Vec<&'c Candidate> {
        let top_k = self.config.top_k;
        let documents: BTreeSet<DocumentId> =
            ranked.iter().map(|c| c.heading_ref.document_id).collect();
        let strict = documents.len() >= self.config.cap_min_documents;

        let mut chosen: Vec<usize> = Vec::new();
        let mut titles: HashSet<(DocumentId, &str)> = HashSet::new();
        let mut per_document: HashMap<DocumentId, usize> = HashMap::new();

        for (i, c) in ranked.iter().enumerate() {
            if chosen.len() >= top_k {
                break;
            }
            let doc = c.heading_ref.document_id;
            if titles.contains(&(doc, c.title_key.as_str())) {
                continue;
            }
            if per_document.get(&doc).copied().unwrap_or(0) >= self.config.per_document_cap {
                continue;
            }
            titles.insert((doc, c.title_key.as_str()));
            *per_document.entry(doc).or_default() += 1;
            chosen.push(i);
        }

        if !strict && chosen.len() < top_k {
            for (i, c) in ranked.iter().enumerate() {
                if chosen.len() >= top_k {
                    break;
                }
                let doc = c.heading_ref.document_id;
                if chosen.contains(&i) || !titles.insert((doc, c.title_key.as_str())) {
                    continue;
                }
                chosen.push(i);
            }
            log::debug!("diversity cap relaxed: {} document(s) with candidates", documents.len());
            chosen.sort_unstable();
        }

        chosen.into_iter().map(|i| &ranked[i]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{BBox, LineLevel, Outline, OutlineEntry};

    /// Scores texts by a fixed table keyed on the first word.
    struct TableEmbedder(HashMap<&'static str, f32>);

    impl Embedder for TableEmbedder {
        fn name(&self) -> &str {
            "table"
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    if i == 0 {
                        return vec![1.0, 0.0];
                    }
                    let key = t.split_whitespace().next().unwrap_or("");
                    let s = self.0.get(key).copied().unwrap_or(0.0);
                    vec![s, (1.0 - s * s).max(0.0).sqrt()]
                })
                .collect())
        }
    }

    struct ShortEmbedder;

    impl Embedder for ShortEmbedder {
        fn name(&self) -> &str {
            "short"
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]; texts.len() - 1])
        }
    }

    fn analysis(doc: usize, titles: &[&str]) -> DocumentAnalysis {
        let mut outline = Outline::new(DocumentId(doc), format!("doc{doc}.pdf"), 1);
        for (i, title) in titles.iter().enumerate() {
            outline.entries.push(OutlineEntry {
                heading: Heading {
                    document_id: DocumentId(doc),
                    page_number: 1,
                    level: LineLevel::H1,
                    text: title.to_string(),
                    span: (i, i),
                    bbox: BBox::new(72.0, 100.0 * i as f32, 300.0, 100.0 * i as f32 + 16.0),
                    font_size: 16.0,
                },
                parent: None,
            });
        }
        DocumentAnalysis {
            outline,
            lines: Vec::new(),
            paragraphs: Vec::new(),
        }
    }

    fn table(entries: &[(&'static str, f32)]) -> TableEmbedder {
        TableEmbedder(entries.iter().copied().collect())
    }

    fn titles(ranked: &[RankedSection], analyses: &[DocumentAnalysis]) -> Vec<String> {
        ranked
            .iter()
            .map(|r| {
                analyses[r.document_id.0]
                    .outline
                    .heading(r.heading_ref.index)
                    .map(|h| h.text.clone())
                    .unwrap_or_default()
            })
            .collect()
    }

    #[test]
    fn test_ranks_are_dense_and_sorted() {
        let analyses = vec![analysis(0, &["Beaches", "Nightlife", "Taxes"])];
        let embedder = table(&[("Beaches", 0.9), ("Nightlife", 0.7), ("Taxes", 0.1)]);
        let config = RankConfig {
            per_document_cap: 3,
            ..RankConfig::default()
        };
        let ranked = RelevanceRanker::new(&embedder, &config).rank("trip", &analyses).unwrap();

        assert_eq!(titles(&ranked, &analyses), vec!["Beaches", "Nightlife", "Taxes"]);
        assert_eq!(ranked.iter().map(|r| r.importance_rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(ranked[0].similarity_score > ranked[1].similarity_score);
    }

    #[test]
    fn test_strict_cap_with_three_documents() {
        let analyses = vec![
            analysis(0, &["Alpha", "Beta", "Gamma"]),
            analysis(1, &["Delta"]),
            analysis(2, &["Epsilon"]),
        ];
        let embedder = table(&[
            ("Alpha", 0.99),
            ("Beta", 0.98),
            ("Gamma", 0.97),
            ("Delta", 0.2),
            ("Epsilon", 0.1),
        ]);
        let config = RankConfig::default();
        let ranked = RelevanceRanker::new(&embedder, &config).rank("q", &analyses).unwrap();

        assert_eq!(titles(&ranked, &analyses), vec!["Alpha", "Beta", "Delta", "Epsilon"]);
    }

    #[test]
    fn test_cap_backfills_with_fewer_documents() {
        let analyses = vec![analysis(0, &["Alpha", "Beta", "Gamma"]), analysis(1, &["Delta"])];
        let embedder = table(&[("Alpha", 0.9), ("Beta", 0.8), ("Gamma", 0.7), ("Delta", 0.1)]);
        let config = RankConfig::default();
        let ranked = RelevanceRanker::new(&embedder, &config).rank("q", &analyses).unwrap();

        assert_eq!(titles(&ranked, &analyses), vec!["Alpha", "Beta", "Gamma", "Delta"]);
    }

    #[test]
    fn test_same_title_in_one_document_is_deduplicated() {
        let analyses = vec![analysis(0, &["Overview", "overview", "Details"])];
        let embedder = table(&[("Overview", 0.9), ("overview", 0.9), ("Details", 0.5)]);
        let config = RankConfig::default();
        let ranked = RelevanceRanker::new(&embedder, &config).rank("q", &analyses).unwrap();
        assert_eq!(titles(&ranked, &analyses), vec!["Overview", "Details"]);
    }

    #[test]
    fn test_ties_break_by_document_order() {
        let analyses = vec![
            analysis(0, &["Introduction"]),
            analysis(1, &["Introduction"]),
            analysis(2, &["Introduction"]),
        ];
        let embedder = table(&[("Introduction", 0.5)]);
        let config = RankConfig::default();
        let ranked = RelevanceRanker::new(&embedder, &config).rank("q", &analyses).unwrap();

        let docs: Vec<usize> = ranked.iter().map(|r| r.document_id.0).collect();
        assert_eq!(docs, vec![0, 1, 2]);
    }

    #[test]
    fn test_count_mismatch_is_fatal() {
        let analyses = vec![analysis(0, &["Alpha"])];
        let config = RankConfig::default();
        let result = RelevanceRanker::new(&ShortEmbedder, &config).rank("q", &analyses);
        assert!(matches!(result, Err(Error::EmbeddingCountMismatch { expected: 2, actual: 1 })));
    }

    #[test]
    fn test_no_candidates_yields_empty_ranking() {
        let analyses = vec![analysis(0, &[])];
        let config = RankConfig::default();
        let ranked = RelevanceRanker::new(&ShortEmbedder, &config).rank("q", &analyses).unwrap();
        assert!(ranked.is_empty());
    }
}
