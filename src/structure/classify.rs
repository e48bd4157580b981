//! Heading classification.
//!
//! Classification is two-pass: [`DocumentContext::build`] gathers
//! document-wide font statistics first, then every line is scored against
//! that immutable context by [`HeadingClassifier`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::config::ClassifierConfig;
use crate::model::{ClassifiedLine, LineLevel, RawLine};
use crate::text::uppercase_ratio;

/// Fallback body size when a document has no measurable text.
const DEFAULT_BODY_SIZE: f32 = 12.0;

/// Font sizes are bucketed to half points.
fn size_key(size: f32) -> i32 {
    (size * 2.0).round() as i32
}

fn key_size(key: i32) -> f32 {
    key as f32 / 2.0
}

/// Most frequent key; ties go to the smaller key.
fn mode_key(histogram: &HashMap<i32, usize>) -> Option<i32> {
    histogram
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(key, _)| *key)
}

/// A font size range mapped to one heading level.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingBand {
    /// Band font size (half-point precision)
    pub size: f32,
    pub level: LineLevel,
    /// Non-noise lines set at this size
    pub line_count: usize,
}

/// Per-page statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct PageStats {
    /// Char-weighted modal font size
    pub body_size: f32,
    /// Whether body-size text on this page is mostly bold
    pub body_is_bold: bool,
    /// Median vertical gap between consecutive lines
    pub line_spacing: f32,
}

/// Immutable document-wide statistics used while classifying lines.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    /// Char-weighted modal font size of the whole document
    pub body_size: f32,
    /// Heading bands, largest first
    pub bands: Vec<HeadingBand>,
    pub page_count: u32,
    pages: BTreeMap<u32, PageStats>,
    /// Gap between each line and the previous non-noise line on its page
    gaps_above: Vec<Option<f32>>,
}

impl DocumentContext {
    /// Collect statistics over `lines` (in reading order), ignoring lines
    /// flagged in `noise`.
    pub fn build(
        lines: &[RawLine],
        noise: &[bool],
        page_count: u32,
        config: &ClassifierConfig,
    ) -> Self {
        let mut doc_hist: HashMap<i32, usize> = HashMap::new();
        let mut page_hist: BTreeMap<u32, HashMap<i32, usize>> = BTreeMap::new();
        let mut band_counts: HashMap<i32, usize> = HashMap::new();
        let mut content_lines = 0usize;

        for (line, _) in lines.iter().zip(noise).filter(|(_, &n)| !n) {
            let key = size_key(line.font_size);
            let chars = line.char_count();
            *doc_hist.entry(key).or_default() += chars;
            *page_hist
                .entry(line.page_number)
                .or_default()
                .entry(key)
                .or_default() += chars;
            *band_counts.entry(key).or_default() += 1;
            content_lines += 1;
        }

        let body_size = mode_key(&doc_hist).map_or(DEFAULT_BODY_SIZE, key_size);
        let doc_body_key = size_key(body_size);

        let gaps_above = gaps_above(lines, noise);

        let mut pages = BTreeMap::new();
        for (&page, hist) in &page_hist {
            // A page dominated by heading-sized text (a cover page) has no
            // body of its own and is scored against the document body.
            let page_body_key = mode_key(hist)
                .filter(|&key| key_size(key) < body_size * config.min_size_ratio)
                .unwrap_or(doc_body_key);
            let (bold_chars, body_chars) = lines
                .iter()
                .zip(noise)
                .filter(|(l, &n)| !n && l.page_number == page && size_key(l.font_size) == page_body_key)
                .fold((0usize, 0usize), |(b, t), (l, _)| {
                    let c = l.char_count();
                    (b + if l.is_bold { c } else { 0 }, t + c)
                });
            let mut page_gaps: Vec<f32> = lines
                .iter()
                .zip(&gaps_above)
                .filter(|(l, _)| l.page_number == page)
                .filter_map(|(_, g)| *g)
                .filter(|g| *g > 0.0)
                .collect();
            pages.insert(
                page,
                PageStats {
                    body_size: key_size(page_body_key),
                    body_is_bold: body_chars > 0 && bold_chars * 2 > body_chars,
                    line_spacing: median(&mut page_gaps).unwrap_or(0.0),
                },
            );
        }

        let bands = build_bands(&band_counts, body_size, content_lines, config);
        log::debug!(
            "document context: body {:.1}pt, {} heading band(s) {:?}",
            body_size,
            bands.len(),
            bands.iter().map(|b| b.size).collect::<Vec<_>>()
        );

        Self {
            body_size,
            bands,
            page_count,
            pages,
            gaps_above,
        }
    }

    /// Statistics for a page; pages without content fall back to the
    /// document body size.
    pub fn page(&self, page_number: u32) -> PageStats {
        self.pages.get(&page_number).cloned().unwrap_or(PageStats {
            body_size: self.body_size,
            body_is_bold: false,
            line_spacing: 0.0,
        })
    }

    /// Vertical gap above the line at `index`, if it has a predecessor on
    /// its page.
    pub fn gap_above(&self, index: usize) -> Option<f32> {
        self.gaps_above.get(index).copied().flatten()
    }

    /// Level for a line with no matching band.
    fn emphasis_level(&self) -> LineLevel {
        if self.bands.len() <= 1 {
            return LineLevel::H1;
        }
        let deepest = self
            .bands
            .iter()
            .filter_map(|b| b.level.depth())
            .max()
            .unwrap_or(0);
        LineLevel::from_depth(deepest + 1)
    }
}

fn build_bands(
    counts: &HashMap<i32, usize>,
    body_size: f32,
    content_lines: usize,
    config: &ClassifierConfig,
) -> Vec<HeadingBand> {
    let max_lines = config.max_band_share * content_lines as f32;
    let mut bands: Vec<(i32, usize)> = counts
        .iter()
        .filter(|(&key, &count)| {
            key_size(key) >= body_size * config.min_size_ratio && count as f32 <= max_lines
        })
        .map(|(&key, &count)| (key, count))
        .collect();
    bands.sort_by(|a, b| b.0.cmp(&a.0));

    let with_title = bands.len() >= 2;
    bands
        .into_iter()
        .enumerate()
        .map(|(i, (key, line_count))| HeadingBand {
            size: key_size(key),
            level: if with_title {
                LineLevel::from_depth(i)
            } else {
                LineLevel::H1
            },
            line_count,
        })
        .collect()
}

fn gaps_above(lines: &[RawLine], noise: &[bool]) -> Vec<Option<f32>> {
    let mut gaps = Vec::with_capacity(lines.len());
    let mut previous: Option<&RawLine> = None;
    for (line, &is_noise) in lines.iter().zip(noise) {
        let gap = previous
            .filter(|p| p.page_number == line.page_number)
            .map(|p| (line.bbox.y0 - p.bbox.y1).max(0.0));
        gaps.push(gap);
        if !is_noise {
            previous = Some(line);
        }
    }
    gaps
}

fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Scores lines against a [`DocumentContext`] and assigns levels.
pub struct HeadingClassifier<'a> {
    config: &'a ClassifierConfig,
    context: &'a DocumentContext,
}

impl<'a> HeadingClassifier<'a> {
    pub fn new(config: &'a ClassifierConfig, context: &'a DocumentContext) -> Self {
        Self { config, context }
    }

    /// Whether the text could be a heading at all.
    pub fn passes_shape_filter(&self, text: &str) -> bool {
        let text = text.trim();
        if !text.chars().any(char::is_alphabetic) {
            return false;
        }
        if text.split_whitespace().count() > self.config.max_heading_words {
            return false;
        }
        if text.matches('.').count() > 3 || text.matches(',').count() > 5 {
            return false;
        }
        !(text.ends_with('.') && text.chars().count() > self.config.max_sentence_heading_chars)
    }

    /// Composite heading score of the line at `index`.
    pub fn score(&self, index: usize, line: &RawLine) -> f32 {
        let page = self.context.page(line.page_number);
        let cfg = self.config;

        let size_score = if page.body_size > 0.0 {
            ((line.font_size / page.body_size - 1.0) / (cfg.full_size_ratio - 1.0)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let bold = if line.is_bold && !page.body_is_bold { 1.0 } else { 0.0 };
        let caps_score = uppercase_ratio(&line.text).unwrap_or(0.0);
        let gap_score = match self.context.gap_above(index) {
            Some(gap) if page.line_spacing > 0.0 => (gap / page.line_spacing - 1.0).clamp(0.0, 1.0),
            _ => 0.0,
        };

        cfg.size_weight * size_score
            + cfg.bold_weight * bold
            + cfg.caps_weight * caps_score
            + cfg.gap_weight * gap_score
    }

    /// Heading level for a qualifying line of the given size.
    pub fn level_for_size(&self, font_size: f32) -> LineLevel {
        let tolerance = self.config.band_tolerance;
        let matches: Vec<&HeadingBand> = self
            .context
            .bands
            .iter()
            .filter(|b| (font_size - b.size).abs() <= tolerance)
            .collect();

        match matches.as_slice() {
            [] => self.context.emphasis_level(),
            [band] => band.level,
            // Bands are sorted largest first.
            [larger, smaller, ..] => {
                let plausible = self.config.max_headings_per_page * self.context.page_count as f32;
                if larger.line_count as f32 > plausible {
                    smaller.level
                } else {
                    larger.level
                }
            }
        }
    }

    /// Classify the line at `index`.
    pub fn classify(&self, index: usize, line: &RawLine, is_noise: bool) -> ClassifiedLine {
        if is_noise {
            return ClassifiedLine::new(line.clone(), LineLevel::Noise, 1.0);
        }
        if !self.passes_shape_filter(&line.text) {
            return ClassifiedLine::new(line.clone(), LineLevel::Body, 1.0);
        }

        let score = self.score(index, line);
        if score < self.config.min_heading_score {
            return ClassifiedLine::new(line.clone(), LineLevel::Body, 1.0 - score);
        }
        ClassifiedLine::new(line.clone(), self.level_for_size(line.font_size), score)
    }
}

/// Classify every line of one document.
///
/// `lines` must be in reading order; `noise` is the mask from
/// [`super::noise_mask`].
pub fn classify_lines(
    lines: &[RawLine],
    noise: &[bool],
    page_count: u32,
    config: &ClassifierConfig,
) -> Vec<ClassifiedLine> {
    let context = DocumentContext::build(lines, noise, page_count, config);
    let classifier = HeadingClassifier::new(config, &context);
    let mut classified: Vec<ClassifiedLine> = lines
        .iter()
        .zip(noise)
        .enumerate()
        .map(|(i, (line, &is_noise))| classifier.classify(i, line, is_noise))
        .collect();
    if config.page_fallback_heading {
        promote_page_fallbacks(&mut classified, config);
    }
    classified
}

/// Promote the first meaningful line of page 1 and of each page that has
/// no heading.
fn promote_page_fallbacks(classified: &mut [ClassifiedLine], config: &ClassifierConfig) {
    let mut by_page: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, c) in classified.iter().enumerate().filter(|(_, c)| !c.is_noise()) {
        by_page.entry(c.line.page_number).or_default().push(i);
    }

    for (page, indices) in by_page {
        let has_heading = indices.iter().any(|&i| classified[i].is_heading());
        if has_heading && page != 1 {
            continue;
        }
        let candidate = indices
            .iter()
            .take(config.fallback_scan_lines)
            .copied()
            .find(|&i| is_fallback_candidate(&classified[i].line.text, config));
        if let Some(i) = candidate {
            if !classified[i].is_heading() {
                log::debug!("page {}: fallback heading {:?}", page, classified[i].line.text);
                classified[i].level = LineLevel::H1;
            }
        }
    }
}

fn is_fallback_candidate(text: &str, config: &ClassifierConfig) -> bool {
    let text = text.trim();
    let chars = text.chars().count();
    chars > config.fallback_min_chars
        && text.split_whitespace().count() >= config.fallback_min_words
        && !(text.ends_with('.') && chars > config.fallback_max_sentence_chars)
}
