//! Outline assembly: ordering, de-duplication and level flattening.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::model::{DocumentId, Heading, LineLevel, Outline, OutlineEntry};
use crate::text::normalize_title;

/// Build a document outline from merged headings.
///
/// Headings are ordered by `(page, top)`. A heading deeper than one level
/// below its nearest shallower ancestor is flattened to that depth; a
/// heading without an ancestor can be at most H1.
pub fn assemble_outline(
    headings: Vec<Heading>,
    document_id: DocumentId,
    filename: &str,
    page_count: u32,
) -> Outline {
    let mut headings = headings;
    headings.sort_by(|a, b| {
        a.page_number.cmp(&b.page_number).then_with(|| {
            a.bbox
                .y0
                .partial_cmp(&b.bbox.y0)
                .unwrap_or(Ordering::Equal)
        })
    });

    let mut outline = Outline::new(document_id, filename, page_count);
    let mut seen: HashSet<(u32, String)> = HashSet::new();
    // (depth, entry index)
    let mut ancestors: Vec<(usize, usize)> = Vec::new();

    for mut heading in headings {
        let key = (heading.page_number, normalize_title(&heading.text));
        if key.1.is_empty() || !seen.insert(key) {
            continue;
        }

        let Some(depth) = heading.level.depth() else {
            continue;
        };
        while ancestors.last().is_some_and(|&(d, _)| d >= depth) {
            ancestors.pop();
        }

        let parent = ancestors.last().copied();
        let max_depth = parent.map_or(LineLevel::H1.depth().unwrap_or(1), |(d, _)| d + 1);
        let depth = if depth > max_depth {
            log::debug!(
                "flattening '{}' from {} to {}",
                heading.text,
                heading.level,
                LineLevel::from_depth(max_depth)
            );
            heading.level = LineLevel::from_depth(max_depth);
            max_depth
        } else {
            depth
        };

        let index = outline.entries.len();
        outline.entries.push(OutlineEntry {
            heading,
            parent: parent.map(|(_, i)| i),
        });
        ancestors.push((depth, index));
    }

    outline
}
