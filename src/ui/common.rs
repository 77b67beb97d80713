//! Common UI components shared across views.
//!
//! This module contains the header bar, status bar, help overlay, and the
//! notice shown when the terminal is too small.

use checkwatch_types::{StatefulTimepoint, TimepointStatus};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::projection::status_counts;

/// Render the header bar with the state of the visible section.
///
/// Displays: worst status indicator, counts per status, probe count.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref timeline) = app.timeline else {
        let line = Line::from(vec![
            Span::styled(" CHECKWATCH ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("| Loading..."),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let visible = app.visible_stateful();
    let counts = status_counts(&visible);
    let worst = worst_status(&visible);

    let mut spans = vec![
        Span::styled(" ● ", app.theme.status_style(worst)),
        Span::styled("CHECKWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
    ];
    for status in [
        TimepointStatus::Success,
        TimepointStatus::Failure,
        TimepointStatus::Missing,
        TimepointStatus::Pending,
    ] {
        let count = counts.get(&status).copied().unwrap_or(0);
        if count > 0 {
            spans.push(Span::styled(count.to_string(), app.theme.status_style(status)));
        } else {
            spans.push(Span::styled("0", Style::default().add_modifier(Modifier::DIM)));
        }
        spans.push(Span::raw(format!(" {} ", status.label())));
    }
    spans.push(Span::raw("│ "));
    spans.push(Span::styled(
        timeline.probes().count().to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::raw(" probes │ "));
    spans.push(Span::styled(
        timeline.timepoints().len().to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::raw(" timepoints"));
    if app.is_refreshing() {
        spans.push(Span::styled(" │ ⟳ refreshing", Style::default().fg(app.theme.pending)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Worst status in `timepoints`, success when empty.
pub fn worst_status(timepoints: &[StatefulTimepoint]) -> TimepointStatus {
    timepoints
        .iter()
        .map(|tp| tp.status)
        .filter(|s| *s != TimepointStatus::Pending)
        .max()
        .unwrap_or(TimepointStatus::Success)
}

/// Render the status bar at the bottom.
///
/// Shows: source, page and section position, available controls.
/// Also displays temporary status messages and errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = if let Some(ref err) = app.load_error {
        format!(" Error: {} | q:quit r:retry", err)
    } else if app.timeline.is_some() {
        let controls = if app.show_detail_overlay {
            "←/→:select Esc:close"
        } else {
            "←/→:select PgUp/PgDn:section [/]:page Enter:detail ?:help q:quit"
        };
        format!(
            " {} | Page {}/{} Section {}/{} | {}",
            app.source_description(),
            app.window.page_index() + 1,
            app.window.pages().len().max(1),
            app.window.section_index() + 1,
            app.window.sections().len().max(1),
            controls,
        )
    } else {
        " Loading... | q:quit".to_string()
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ←/→ h/l     Select older/newer"),
        Line::from("  PgUp/PgDn   Older/newer section"),
        Line::from("  [ / ]       Older/newer page"),
        Line::from("  Home/End    Jump to newest/oldest"),
        Line::from("  Enter       View detail"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  r         Reload data"),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 19u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// Where the too-small notice goes: five rows centered vertically, clipped
/// to `area`.
pub fn too_small_area(area: Rect) -> Rect {
    let y = area.y + (area.height / 2).saturating_sub(2);
    Rect::new(area.x, y, area.width, 5).intersection(area)
}

/// Render the notice asking for a larger terminal.
pub fn render_too_small(frame: &mut Frame, area: Rect, min_width: u16, min_height: u16) {
    let msg = format!(
        "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
        area.width, area.height, min_width, min_height
    );
    let paragraph = Paragraph::new(msg)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(paragraph, too_small_area(area));
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkwatch_types::{CheckConfig, StatelessTimepoint};
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
    fn test_worst_status_ignores_pending() {
        assert_eq!(worst_status(&[]), TimepointStatus::Success);
        let tps = vec![
            with_status(TimepointStatus::Success),
            with_status(TimepointStatus::Pending),
        ];
        assert_eq!(worst_status(&tps), TimepointStatus::Success);

        let tps = vec![
            with_status(TimepointStatus::Missing),
            with_status(TimepointStatus::Failure),
        ];
        assert_eq!(worst_status(&tps), TimepointStatus::Failure);
    }

    #[test]
    fn test_too_small_area_fits_tiny_terminals() {
        for height in 0..4 {
            let area = Rect::new(0, 0, 30, height);
            let notice = too_small_area(area);
            assert_eq!(notice.y, 0);
            assert!(notice.bottom() <= area.bottom());
        }

        let notice = too_small_area(Rect::new(0, 0, 50, 11));
        assert_eq!(notice, Rect::new(0, 3, 50, 5));
    }
}
