//! Minimap strip for the current page.

use checkwatch_types::{MiniMapSection, StatefulTimepoint, TimepointStatus};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;
use crate::ui::common::worst_status;

/// Render `Page n/m` followed by one block per section, oldest on the left.
///
/// Each block takes the worst status of its timepoints; the visible
/// section is bracketed.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref timeline) = app.timeline else {
        frame.render_widget(Paragraph::new(""), area);
        return;
    };

    let sections = app.window.sections();
    let grid = timeline.timepoints();

    let mut spans = vec![Span::styled(
        format!(" Page {}/{} ", app.window.page_index() + 1, app.window.pages().len().max(1)),
        Style::default().add_modifier(Modifier::BOLD),
    )];

    for (index, section) in sections.iter().enumerate().rev() {
        let projected = timeline.project(section_slice(grid, section));
        let status = section_status(&projected);
        let style = app.theme.status_style(status);
        let glyph = "■".repeat(section_glyphs(section));
        if index == app.window.section_index() {
            spans.push(Span::styled("[", Style::default().fg(app.theme.highlight)));
            spans.push(Span::styled(glyph, style.add_modifier(Modifier::BOLD)));
            spans.push(Span::styled("]", Style::default().fg(app.theme.highlight)));
        } else {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(glyph, style));
            spans.push(Span::raw(" "));
        }
    }

    if let Some(section) = app.window.current_section() {
        spans.push(Span::styled(
            format!("  #{}..#{} of {}", section.start, section.end, grid.len()),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn section_slice<'a, T>(grid: &'a [T], section: &MiniMapSection) -> &'a [T] {
    if section.start >= grid.len() {
        return &[];
    }
    &grid[section.start..=section.end.min(grid.len() - 1)]
}

/// Short sections draw narrower so a trailing partial section reads as such.
fn section_glyphs(section: &MiniMapSection) -> usize {
    if section.end - section.start < 2 {
        1
    } else {
        2
    }
}

/// Pending only when nothing in the section has settled.
pub fn section_status(timepoints: &[StatefulTimepoint]) -> TimepointStatus {
    if !timepoints.is_empty() && timepoints.iter().all(|tp| tp.status == TimepointStatus::Pending) {
        TimepointStatus::Pending
    } else {
        worst_status(timepoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkwatch_types::{CheckConfig, IndexRange, StatelessTimepoint};
    use std::collections::BTreeMap;

    fn with_status(status: TimepointStatus) -> StatefulTimepoint {
        StatefulTimepoint {
            timepoint: StatelessTimepoint {
                adjusted_time: 0,
                config: CheckConfig::new(1_000, 0),
                timepoint_duration: 1_000,
                index: 0,
            },
            probe_results: BTreeMap::new(),
            status,
            max_probe_duration: 0,
        }
    }

    #[test]
    fn test_section_status() {
        assert_eq!(
            section_status(&[with_status(TimepointStatus::Pending)]),
            TimepointStatus::Pending
        );
        assert_eq!(
            section_status(&[
                with_status(TimepointStatus::Pending),
                with_status(TimepointStatus::Missing)
            ]),
            TimepointStatus::Missing
        );
        assert_eq!(section_status(&[]), TimepointStatus::Success);
    }

    #[test]
    fn test_section_slice_clamps_to_grid() {
        let grid = [0, 1, 2, 3, 4];
        assert_eq!(section_slice(&grid, &IndexRange::new(3, 9)), &[3, 4]);
        assert!(section_slice(&grid, &IndexRange::new(5, 9)).is_empty());
        assert_eq!(section_glyphs(&IndexRange::new(0, 1)), 1);
        assert_eq!(section_glyphs(&IndexRange::new(0, 9)), 2);
    }
}
