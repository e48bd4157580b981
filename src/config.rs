//! Analysis configuration.
//!
//! Every heuristic threshold used by the pipeline is a named field here.
//! All structs deserialize with defaults, so a config file only needs the
//! fields it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Options for a full analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Noise (header/footer/page number) detection
    pub noise: NoiseConfig,

    /// Heading classification
    pub classifier: ClassifierConfig,

    /// Multi-line heading merging
    pub merge: MergeConfig,

    /// Relevance ranking
    pub rank: RankConfig,

    /// Subsection summarization
    pub summary: SummaryConfig,

    /// Whether to analyse documents in parallel
    pub parallel: bool,
}

impl AnalysisConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the number of ranked sections.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.rank.top_k = top_k;
        self
    }

    /// Set the per-document diversity cap.
    pub fn with_document_cap(mut self, cap: usize) -> Self {
        self.rank.per_document_cap = cap;
        self
    }

    /// Set the summary duplicate-similarity threshold.
    pub fn with_duplicate_threshold(mut self, threshold: f32) -> Self {
        self.summary.duplicate_threshold = threshold;
        self
    }

    /// Set the summary length budget in characters.
    pub fn with_summary_chars(mut self, chars: usize) -> Self {
        self.summary.target_chars = chars;
        self
    }

    /// Enable or disable parallel document processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enable or disable the per-page fallback heading.
    pub fn with_page_fallback_heading(mut self, enabled: bool) -> Self {
        self.classifier.page_fallback_heading = enabled;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Reject values that would make a stage meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.rank.top_k == 0 {
            return Err(Error::Config("rank.top_k must be at least 1".into()));
        }
        if self.rank.per_document_cap == 0 {
            return Err(Error::Config("rank.per_document_cap must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.noise.min_page_fraction) {
            return Err(Error::Config("noise.min_page_fraction must be within [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.summary.duplicate_threshold)
            || self.summary.duplicate_threshold == 0.0
        {
            return Err(Error::Config(
                "summary.duplicate_threshold must be within (0, 1]".into(),
            ));
        }
        if self.classifier.full_size_ratio <= 1.0 {
            return Err(Error::Config("classifier.full_size_ratio must exceed 1.0".into()));
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            noise: NoiseConfig::default(),
            classifier: ClassifierConfig::default(),
            merge: MergeConfig::default(),
            rank: RankConfig::default(),
            summary: SummaryConfig::default(),
            parallel: true,
        }
    }
}

/// Running header/footer and page number detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Fraction of pages a line must repeat on to count as boilerplate
    pub min_page_fraction: f32,

    /// Maximum vertical drift (points) between repeats
    pub position_tolerance: f32,

    /// Longest line (characters) considered for repetition
    pub max_repeated_chars: usize,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            min_page_fraction: 0.5,
            position_tolerance: 6.0,
            max_repeated_chars: 120,
        }
    }
}

/// Heading scoring weights and band construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum size ratio over body text for a font size to form a band
    pub min_size_ratio: f32,

    /// Size ratio at which the size component saturates
    pub full_size_ratio: f32,

    /// Font sizes within this distance (points) share a band
    pub band_tolerance: f32,

    /// Bands holding more than this share of lines are treated as body
    pub max_band_share: f32,

    /// Plausible headings per page, used to break ties between bands
    pub max_headings_per_page: f32,

    /// Composite score below which a line is body text
    pub min_heading_score: f32,

    pub size_weight: f32,
    pub bold_weight: f32,
    pub caps_weight: f32,
    pub gap_weight: f32,

    /// Longest line (in words) that can be a heading
    pub max_heading_words: usize,

    /// Lines ending in a period and longer than this are body text
    pub max_sentence_heading_chars: usize,

    /// Promote the first meaningful line of page 1 and of every page
    /// without a heading to H1. Off by default.
    pub page_fallback_heading: bool,

    /// Lines scanned from the top of a page for a fallback heading
    pub fallback_scan_lines: usize,

    /// A fallback heading must be longer than this (characters)
    pub fallback_min_chars: usize,

    /// A fallback heading needs at least this many words
    pub fallback_min_words: usize,

    /// Fallback candidates ending in a period and longer than this are skipped
    pub fallback_max_sentence_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_size_ratio: 1.15,
            full_size_ratio: 1.5,
            band_tolerance: 0.5,
            max_band_share: 0.4,
            max_headings_per_page: 8.0,
            min_heading_score: 0.35,
            size_weight: 0.5,
            bold_weight: 0.3,
            caps_weight: 0.15,
            gap_weight: 0.2,
            max_heading_words: 20,
            max_sentence_heading_chars: 80,
            page_fallback_heading: false,
            fallback_scan_lines: 10,
            fallback_min_chars: 10,
            fallback_min_words: 2,
            fallback_max_sentence_chars: 100,
        }
    }
}

/// Multi-line heading merge rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Maximum gap between lines as a multiple of the upper line's height
    pub gap_multiple: f32,

    /// Maximum font size difference (points)
    pub font_tolerance: f32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            gap_multiple: 1.0,
            font_tolerance: 1.0,
        }
    }
}

/// Relevance ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// Number of sections to select
    pub top_k: usize,

    /// Maximum slots taken by a single document
    pub per_document_cap: usize,

    /// Documents with candidates needed before the cap becomes strict
    pub cap_min_documents: usize,

    /// Heading context length (characters) sent to the embedder
    pub context_chars: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            per_document_cap: 2,
            cap_min_documents: 3,
            context_chars: 600,
        }
    }
}

/// Subsection summarization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Length budget in characters
    pub target_chars: usize,

    /// Summaries at or above this similarity are near-duplicates
    pub duplicate_threshold: f32,

    /// Paragraph break: line gap as a multiple of the page's average spacing
    pub paragraph_gap_ratio: f32,

    /// Paragraph break: left-edge shift in points
    pub indent_shift: f32,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            target_chars: 500,
            duplicate_threshold: 0.7,
            paragraph_gap_ratio: 1.5,
            indent_shift: 20.0,
        }
    }
}
