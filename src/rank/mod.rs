//! Relevance ranking and subsection summarization.
//!
//! The [`RelevanceRanker`] embeds the persona/job query together with one
//! context string per outline heading in a single [`Embedder`] call, scores
//! headings by cosine similarity and applies the de-duplication and
//! per-document diversity rules. The [`SubsectionSummarizer`] then produces
//! one near-duplicate-free summary per ranked section.

mod embed;
mod ranker;
mod similarity;
mod summarize;

pub use embed::{validate_embeddings, Embedder, HashingEmbedder, DEFAULT_DIMENSION};
#[cfg(feature = "local-embeddings")]
pub use embed::MiniLmEmbedder;
pub use ranker::{heading_context, RelevanceRanker};
pub use similarity::{cosine_similarity, l2_normalize};
pub use summarize::SubsectionSummarizer;
