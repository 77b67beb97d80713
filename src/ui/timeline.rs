//! Timeline rendering.
//!
//! One column group per visible timepoint, oldest on the left. Bar height is
//! the longest probe duration scaled against the visible section. Below the
//! bars sit the annotation row and the time axis.

use checkwatch_types::{AnnotationWithIndices, StatefulTimepoint, TimepointStatus};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{format_clock, Theme};
use crate::app::App;
use crate::data::duration::format_interval_ms;
use crate::data::max_probe_duration;

/// Render the visible section of the timeline.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let visible = app.visible_stateful();
    let scale = max_probe_duration(&visible);

    let title = match (visible.first(), visible.last()) {
        (Some(first), Some(last)) => format!(
            " Timeline {} → {} (max {}) ",
            format_clock(first.adjusted_time()),
            format_clock(last.adjusted_time()),
            format_interval_ms(scale),
        ),
        _ => " Timeline ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if visible.is_empty() {
        let message = match app.load_error {
            Some(_) => "No timeline available",
            None => "No timepoints in range",
        };
        let paragraph = Paragraph::new(message).style(Style::default().add_modifier(Modifier::DIM));
        frame.render_widget(paragraph, inner);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Min(1),    // Bars
        Constraint::Length(1), // Annotations
        Constraint::Length(1), // Time axis
    ])
    .split(inner);

    let cell_width = app.cell_width();
    let bars = bar_lines(&visible, app.selected, chunks[0].height, cell_width, scale, &app.theme);
    frame.render_widget(Paragraph::new(bars), chunks[0]);

    let annotations = app.visible_annotations();
    let row = annotation_line(&annotations, visible.len(), cell_width, &app.theme);
    frame.render_widget(Paragraph::new(row), chunks[1]);

    let axis = axis_line(&visible, app.selected, chunks[2].width);
    frame.render_widget(
        Paragraph::new(axis).style(Style::default().add_modifier(Modifier::DIM)),
        chunks[2],
    );
}

/// Rows a timepoint's bar fills out of `rows`.
pub fn bar_height(timepoint: &StatefulTimepoint, scale: i64, rows: u16) -> u16 {
    if rows == 0 {
        return 0;
    }
    match timepoint.status {
        TimepointStatus::Success | TimepointStatus::Failure if timepoint.max_probe_duration > 0 => {
            let filled = (timepoint.max_probe_duration as f64 / scale.max(1) as f64 * rows as f64).ceil();
            (filled as u16).clamp(1, rows)
        }
        _ => 1,
    }
}

fn bar_glyph(status: TimepointStatus) -> char {
    match status {
        TimepointStatus::Success | TimepointStatus::Failure => '█',
        TimepointStatus::Pending => '░',
        TimepointStatus::Missing => '·',
    }
}

/// Bars drawn top row first.
pub fn bar_lines(
    visible: &[StatefulTimepoint],
    selected: usize,
    rows: u16,
    cell_width: u16,
    scale: i64,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let bar_width = cell_width.saturating_sub(1).max(1) as usize;
    let gap = cell_width as usize - bar_width.min(cell_width as usize);
    let heights: Vec<u16> = visible.iter().map(|tp| bar_height(tp, scale, rows)).collect();

    (0..rows)
        .map(|row| {
            let level = rows - row;
            let spans: Vec<Span> = visible
                .iter()
                .zip(&heights)
                .enumerate()
                .flat_map(|(i, (tp, height))| {
                    let glyph = if *height >= level { bar_glyph(tp.status) } else { ' ' };
                    let mut style = theme.status_style(tp.status);
                    if i == selected {
                        style = style.patch(theme.selected);
                    }
                    [
                        Span::styled(glyph.to_string().repeat(bar_width), style),
                        Span::raw(" ".repeat(gap)),
                    ]
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// Glyph per terminal column for the annotation row.
///
/// Ranges are drawn as a rule across their cells with arrows where they run
/// past the visible section. Instants are a single tick at their cell.
pub fn annotation_cells(
    annotations: &[AnnotationWithIndices],
    visible_len: usize,
    cell_width: u16,
) -> Vec<Option<(char, usize)>> {
    let cell_width = cell_width.max(1) as usize;
    let width = visible_len * cell_width;
    let mut cells = vec![None; width];

    for (n, annotation) in annotations.iter().enumerate() {
        let from = annotation.visible_start_index * cell_width;
        let to = (annotation.visible_end_index * cell_width + cell_width - 1).min(width.saturating_sub(1));
        if from >= width {
            continue;
        }
        if annotation.is_instant {
            cells[from] = Some(('│', n));
            continue;
        }
        for cell in &mut cells[from..=to] {
            *cell = Some(('─', n));
        }
        if annotation.is_clipped_start {
            cells[from] = Some(('◀', n));
        }
        if annotation.is_clipped_end {
            cells[to] = Some(('▶', n));
        }
    }
    cells
}

fn annotation_line(
    annotations: &[AnnotationWithIndices],
    visible_len: usize,
    cell_width: u16,
    theme: &Theme,
) -> Line<'static> {
    let spans: Vec<Span> = annotation_cells(annotations, visible_len, cell_width)
        .into_iter()
        .map(|cell| match cell {
            Some((glyph, n)) => Span::styled(
                glyph.to_string(),
                Style::default().fg(theme.event_color(&annotations[n].event)),
            ),
            None => Span::raw(" "),
        })
        .collect();
    Line::from(spans)
}

/// Oldest time on the left, newest on the right, selection in between.
fn axis_line(visible: &[StatefulTimepoint], selected: usize, width: u16) -> String {
    let (Some(first), Some(last)) = (visible.first(), visible.last()) else {
        return String::new();
    };
    let left = format_clock(first.adjusted_time());
    let right = format_clock(last.adjusted_time());
    let middle = visible
        .get(selected)
        .map(|tp| format!("[{}]", format_clock(tp.adjusted_time())))
        .unwrap_or_default();

    let width = width as usize;
    let used = left.len() + middle.chars().count() + right.len();
    if used + 2 > width {
        return left;
    }
    let spare = width - used;
    format!(
        "{}{}{}{}{}",
        left,
        " ".repeat(spare / 2),
        middle,
        " ".repeat(spare - spare / 2),
        right
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkwatch_types::{CheckConfig, CheckEvent, CheckEventLabel, StatelessTimepoint};
    use std::collections::BTreeMap;

    fn timepoint(status: TimepointStatus, duration: i64) -> StatefulTimepoint {
        StatefulTimepoint {
            timepoint: StatelessTimepoint {
                adjusted_time: 0,
                config: CheckConfig::new(60_000, 0),
                timepoint_duration: 60_000,
                index: 0,
            },
            probe_results: BTreeMap::new(),
            status,
            max_probe_duration: duration,
        }
    }

    fn annotation(start: usize, end: usize, clipped: (bool, bool), instant: bool) -> AnnotationWithIndices {
        AnnotationWithIndices {
            event: CheckEvent::range(CheckEventLabel::BeforeCreation, None, None),
            is_clipped_start: clipped.0,
            is_clipped_end: clipped.1,
            is_instant: instant,
            visible_start_index: start,
            visible_end_index: end,
        }
    }

    #[test]
    fn test_bar_height_scales_to_rows() {
        assert_eq!(bar_height(&timepoint(TimepointStatus::Success, 2_000), 2_000, 8), 8);
        assert_eq!(bar_height(&timepoint(TimepointStatus::Failure, 1_000), 2_000, 8), 4);
        assert_eq!(bar_height(&timepoint(TimepointStatus::Success, 1), 2_000, 8), 1);
        assert_eq!(bar_height(&timepoint(TimepointStatus::Success, 0), 2_000, 8), 1);
        assert_eq!(bar_height(&timepoint(TimepointStatus::Missing, 0), 2_000, 8), 1);
        assert_eq!(bar_height(&timepoint(TimepointStatus::Success, 500), 1_000, 0), 0);
    }

    #[test]
    fn test_bar_lines_fill_from_the_bottom() {
        let visible = vec![
            timepoint(TimepointStatus::Success, 1_000),
            timepoint(TimepointStatus::Missing, 0),
        ];
        let lines = bar_lines(&visible, 0, 2, 2, 1_000, &Theme::dark());
        assert_eq!(lines.len(), 2);
        let top: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        let bottom: String = lines[1].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(top, "█   ");
        assert_eq!(bottom, "█ · ");
    }

    #[test]
    fn test_annotation_cells_mark_clipping() {
        let annotations = vec![annotation(0, 2, (true, false), false)];
        let cells: String = annotation_cells(&annotations, 4, 1)
            .into_iter()
            .map(|c| c.map_or(' ', |(glyph, _)| glyph))
            .collect();
        assert_eq!(cells, "◀── ");

        let annotations = vec![annotation(1, 3, (false, true), false), annotation(0, 0, (false, false), true)];
        let cells: String = annotation_cells(&annotations, 4, 2)
            .into_iter()
            .map(|c| c.map_or(' ', |(glyph, _)| glyph))
            .collect();
        assert_eq!(cells, "│ ─────▶");
    }

    #[test]
    fn test_axis_line_falls_back_to_left_label() {
        let visible = vec![timepoint(TimepointStatus::Success, 0)];
        assert_eq!(axis_line(&visible, 0, 10), "00:00:00");
        let wide = axis_line(&visible, 0, 40);
        assert!(wide.starts_with("00:00:00"));
        assert!(wide.contains("[00:00:00]"));
        assert_eq!(wide.chars().count(), 40);
    }
}
