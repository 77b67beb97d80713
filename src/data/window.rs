//! Visible window over the timepoint grid.
//!
//! The reconciler owns only index ranges. It decides which section of which
//! page is on screen and keeps that choice stable when the viewport width, and
//! with it the number of timepoints per section, changes.

use checkwatch_types::{IndexRange, MiniMapPage, MiniMapSection};
use tracing::debug;

use super::minimap::{find_nearest, get_mini_map_pages, get_mini_map_sections};

/// Terminal columns to timepoint count, at least one.
pub fn display_count_for_width(width: u16, cell_width: u16) -> usize {
    (width / cell_width.max(1)).max(1) as usize
}

/// Page and section navigation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowReconciler {
    total_count: usize,
    display_count: usize,
    sections_per_page: usize,
    pages: Vec<MiniMapPage>,
    page_index: usize,
    section_index: usize,
}

impl WindowReconciler {
    /// Start at the newest section of the newest page.
    pub fn new(total_count: usize, display_count: usize, sections_per_page: usize) -> Self {
        let display_count = display_count.max(1);
        let sections_per_page = sections_per_page.max(1);
        Self {
            total_count,
            display_count,
            sections_per_page,
            pages: get_mini_map_pages(total_count, display_count, sections_per_page),
            page_index: 0,
            section_index: 0,
        }
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn display_count(&self) -> usize {
        self.display_count
    }

    pub fn sections_per_page(&self) -> usize {
        self.sections_per_page
    }

    pub fn pages(&self) -> &[MiniMapPage] {
        &self.pages
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn section_index(&self) -> usize {
        self.section_index
    }

    pub fn current_page(&self) -> Option<&MiniMapPage> {
        self.pages.get(self.page_index)
    }

    /// Sections of the current page, most recent first.
    pub fn sections(&self) -> Vec<MiniMapSection> {
        self.current_page()
            .map(|page| get_mini_map_sections(page, self.display_count))
            .unwrap_or_default()
    }

    /// The index range on screen, `None` for an empty grid.
    pub fn current_section(&self) -> Option<MiniMapSection> {
        self.sections().get(self.section_index).copied()
    }

    /// The slice of `grid` on screen.
    pub fn visible_timepoints<'a, T>(&self, grid: &'a [T]) -> &'a [T] {
        match self.current_section() {
            Some(section) if section.start < grid.len() => {
                &grid[section.start..=section.end.min(grid.len() - 1)]
            }
            _ => &[],
        }
    }

    pub fn is_at_newest(&self) -> bool {
        self.page_index == 0 && self.section_index == 0
    }

    /// Change the number of timepoints per section and re-anchor.
    ///
    /// The new page is the one that best matches the previously visible
    /// section, then the new section is chosen within it the same way.
    /// Returns whether anything changed.
    pub fn set_display_count(&mut self, display_count: usize) -> bool {
        let display_count = display_count.max(1);
        if display_count == self.display_count {
            return false;
        }

        let previous = self.current_section();
        self.display_count = display_count;
        self.pages = get_mini_map_pages(self.total_count, display_count, self.sections_per_page);
        self.reanchor(previous);

        debug!(
            display_count,
            page = self.page_index,
            section = self.section_index,
            "re-anchored window after resize"
        );
        true
    }

    /// Adopt a new grid size. A window at the newest section stays there,
    /// anything else is re-anchored to the indices it was showing.
    pub fn set_total_count(&mut self, total_count: usize) {
        if total_count == self.total_count {
            return;
        }

        let follow_newest = self.is_at_newest();
        let previous = self.current_section();
        self.total_count = total_count;
        self.pages = get_mini_map_pages(total_count, self.display_count, self.sections_per_page);

        if follow_newest {
            self.jump_to_newest();
        } else {
            self.reanchor(previous);
        }
    }

    /// Select a page by index, clamped, showing its newest section.
    pub fn go_to_page(&mut self, page_index: usize) {
        self.page_index = page_index.min(self.pages.len().saturating_sub(1));
        self.section_index = 0;
    }

    /// Select a section of the current page by index, clamped.
    pub fn go_to_section(&mut self, section_index: usize) {
        self.section_index = section_index.min(self.sections().len().saturating_sub(1));
    }

    /// Move one section back in time, crossing into the next page.
    pub fn older_section(&mut self) -> bool {
        if self.section_index + 1 < self.sections().len() {
            self.section_index += 1;
            true
        } else if self.page_index + 1 < self.pages.len() {
            self.page_index += 1;
            self.section_index = 0;
            true
        } else {
            false
        }
    }

    /// Move one section forward in time, crossing into the previous page.
    pub fn newer_section(&mut self) -> bool {
        if self.section_index > 0 {
            self.section_index -= 1;
            true
        } else if self.page_index > 0 {
            self.page_index -= 1;
            self.section_index = self.sections().len().saturating_sub(1);
            true
        } else {
            false
        }
    }

    pub fn older_page(&mut self) -> bool {
        if self.page_index + 1 < self.pages.len() {
            self.go_to_page(self.page_index + 1);
            true
        } else {
            false
        }
    }

    pub fn newer_page(&mut self) -> bool {
        if self.page_index > 0 {
            self.go_to_page(self.page_index - 1);
            true
        } else {
            false
        }
    }

    pub fn jump_to_newest(&mut self) {
        self.page_index = 0;
        self.section_index = 0;
    }

    pub fn jump_to_oldest(&mut self) {
        self.page_index = self.pages.len().saturating_sub(1);
        self.section_index = self.sections().len().saturating_sub(1);
    }

    fn reanchor(&mut self, previous: Option<IndexRange>) {
        let Some(previous) = previous else {
            self.jump_to_newest();
            return;
        };

        self.page_index = find_nearest(&self.pages, &previous).unwrap_or(0);
        self.section_index = find_nearest(&self.sections(), &previous).unwrap_or(0);
    }
}
