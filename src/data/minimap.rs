//! Partitioning the grid index space into minimap pages and sections.
//!
//! Both partitions run most-recent-first: entry 0 holds the highest indices
//! and the oldest entry absorbs whatever does not fill a whole one.

use checkwatch_types::{IndexRange, MiniMapPage, MiniMapSection};

/// Pages of `display_count * sections_per_page` timepoints over
/// `[0, total_count - 1]`. A `sections_per_page` of 0 behaves as 1.
///
/// ```
/// use checkwatch::data::minimap::get_mini_map_pages;
/// use checkwatch_types::IndexRange;
///
/// let pages = get_mini_map_pages(63, 10, 6);
/// assert_eq!(pages, vec![IndexRange::new(3, 62), IndexRange::new(0, 2)]);
/// ```
pub fn get_mini_map_pages(
    total_count: usize,
    display_count: usize,
    sections_per_page: usize,
) -> Vec<MiniMapPage> {
    if total_count == 0 {
        return Vec::new();
    }
    let page_size = display_count.saturating_mul(sections_per_page.max(1));
    partition_recent_first(IndexRange::new(0, total_count - 1), page_size)
}

/// Sections of `section_size` timepoints within `page`.
pub fn get_mini_map_sections(page: &MiniMapPage, section_size: usize) -> Vec<MiniMapSection> {
    partition_recent_first(*page, section_size)
}

/// Index of the candidate that best matches `previous`.
///
/// When every candidate overlaps `previous` by the same amount (including
/// not at all) the newest candidate wins. Otherwise the largest overlap wins,
/// with ties going to the candidate that starts later. `None` only for an
/// empty candidate list.
pub fn find_nearest(candidates: &[IndexRange], previous: &IndexRange) -> Option<usize> {
    let overlaps: Vec<usize> = candidates.iter().map(|c| c.overlap(previous)).collect();
    let first = *overlaps.first()?;

    if overlaps.iter().all(|&o| o == first) {
        return candidates
            .iter()
            .enumerate()
            .max_by_key(|(_, c)| c.end)
            .map(|(i, _)| i);
    }

    candidates
        .iter()
        .zip(&overlaps)
        .enumerate()
        .max_by_key(|(_, (c, &overlap))| (overlap, c.start))
        .map(|(i, _)| i)
}

fn partition_recent_first(range: IndexRange, size: usize) -> Vec<IndexRange> {
    if size == 0 {
        return Vec::new();
    }

    let mut parts = Vec::with_capacity(range.len().div_ceil(size));
    let mut end = range.end;
    loop {
        let start = (end + 1).saturating_sub(size).max(range.start);
        parts.push(IndexRange::new(start, end));
        if start == range.start {
            break;
        }
        end = start - 1;
    }
    parts
}
