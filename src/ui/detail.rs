//! Detail overlay rendering.
//!
//! Displays a modal overlay with the probe results of the selected timepoint.

use checkwatch_types::{StatefulTimepoint, TimepointStatus};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use super::format_clock;
use crate::app::App;
use crate::data::duration::format_interval_ms;
use crate::data::{Execution, ExecutionMarkers, LogRole};

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 16;

/// One probe's execution for a timepoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSummary {
    pub probe: String,
    pub outcome: Option<LogRole>,
    pub duration_ms: Option<i64>,
    pub log_count: usize,
    pub last_msg: String,
}

/// Summarize each probe's execution, in probe name order.
pub fn probe_summaries(timepoint: &StatefulTimepoint, markers: &ExecutionMarkers) -> Vec<ProbeSummary> {
    timepoint
        .probe_results
        .iter()
        .filter_map(|(probe, logs)| {
            let execution = Execution::new(logs.clone())?;
            let last_msg = execution
                .logs()
                .last()
                .and_then(|r| r.msg())
                .unwrap_or_default()
                .to_string();
            Some(ProbeSummary {
                probe: probe.clone(),
                outcome: execution.outcome(markers),
                duration_ms: execution.duration_ms(markers),
                log_count: execution.logs().len(),
                last_msg,
            })
        })
        .collect()
}

fn outcome_label(outcome: Option<LogRole>) -> (&'static str, TimepointStatus) {
    match outcome {
        Some(LogRole::Succeeded) => ("OK", TimepointStatus::Success),
        Some(LogRole::Failed) => ("FAIL", TimepointStatus::Failure),
        _ => ("...", TimepointStatus::Pending),
    }
}

/// Render the timepoint detail as a modal overlay.
///
/// Shows the schedule the timepoint belongs to, its status, and every
/// probe's execution with its log lines.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Skip rendering if terminal is too small for the overlay
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let Some(ref timeline) = app.timeline else {
        return;
    };
    let Some(timepoint) = app.selected_timepoint() else {
        return;
    };

    // Width: 95% of screen, clamped to [MIN_OVERLAY_WIDTH, 100]
    let overlay_width = (area.width * 95 / 100).clamp(MIN_OVERLAY_WIDTH, 100);
    // Height: 90% of screen, clamped to [MIN_OVERLAY_HEIGHT, 50]
    let overlay_height = (area.height * 90 / 100).clamp(MIN_OVERLAY_HEIGHT, 50);

    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    frame.render_widget(Clear, overlay_area);

    let chunks = Layout::vertical([
        Constraint::Length(5), // Timepoint info
        Constraint::Min(10),   // Probes and logs
        Constraint::Length(1), // Footer
    ])
    .split(overlay_area);

    // ===== HEADER SECTION =====
    let tp = &timepoint.timepoint;
    let status_style = app.theme.status_style(timepoint.status);
    let header_lines = vec![
        Line::from(vec![Span::styled(
            format!(
                " Timepoint #{} at {} ",
                tp.index,
                format_clock(tp.adjusted_time)
            ),
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::raw(" Every: "),
            Span::styled(
                format_interval_ms(tp.config.frequency),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("    Max duration: "),
            Span::styled(
                format_interval_ms(timepoint.max_probe_duration),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("    Status: "),
            Span::styled(
                format!("{} {}", timepoint.status.symbol(), timepoint.status.label()),
                status_style.add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    let header_block = Block::default()
        .title(" Timepoint Detail ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    frame.render_widget(Paragraph::new(header_lines).block(header_block), chunks[0]);

    let content_chunks = Layout::vertical([
        Constraint::Percentage(40), // Probes
        Constraint::Percentage(60), // Logs
    ])
    .split(chunks[1]);

    // ----- PROBES TABLE -----
    let summaries = probe_summaries(&timepoint, timeline.markers());
    if !summaries.is_empty() {
        let header = Row::new(vec![
            Cell::from("Probe"),
            Cell::from("Outcome"),
            Cell::from("Duration"),
            Cell::from("Logs"),
            Cell::from("Last message"),
        ])
        .height(1)
        .style(app.theme.header);

        let rows: Vec<Row> = summaries
            .iter()
            .map(|s| {
                let (label, status) = outcome_label(s.outcome);
                Row::new(vec![
                    Cell::from(s.probe.clone()),
                    Cell::from(label).style(app.theme.status_style(status)),
                    Cell::from(s.duration_ms.map(format_interval_ms).unwrap_or("-".into())),
                    Cell::from(s.log_count.to_string()),
                    Cell::from(s.last_msg.clone()),
                ])
            })
            .collect();

        let widths = [
            Constraint::Fill(2),    // Probe
            Constraint::Length(8),  // Outcome
            Constraint::Length(10), // Duration
            Constraint::Length(6),  // Logs
            Constraint::Fill(3),    // Last message
        ];

        let table = Table::new(rows, widths).header(header).block(
            Block::default()
                .title(format!(" Probes ({}) ", summaries.len()))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        );
        frame.render_widget(table, content_chunks[0]);
    } else {
        let empty_block = Block::default()
            .title(" Probes (0) ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));
        let message = match timepoint.status {
            TimepointStatus::Pending => "  Waiting for results",
            _ => "  No probe ran this check",
        };
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(message, Style::default().add_modifier(Modifier::DIM))),
        ])
        .block(empty_block);
        frame.render_widget(empty, content_chunks[0]);
    }

    // ----- LOG LINES -----
    let mut logs: Vec<(&str, &checkwatch_types::ParsedLogRecord)> = timepoint
        .probe_results
        .iter()
        .flat_map(|(probe, records)| records.iter().map(move |r| (probe.as_str(), r)))
        .collect();
    logs.sort_by_key(|(_, r)| r.ts_ns);

    let log_rows: Vec<Row> = logs
        .iter()
        .map(|(probe, record)| {
            let style = match timeline.markers().role(record) {
                LogRole::Failed => app.theme.status_style(TimepointStatus::Failure),
                LogRole::Succeeded => app.theme.status_style(TimepointStatus::Success),
                _ => Style::default(),
            };
            Row::new(vec![
                Cell::from(format_clock(record.time)),
                Cell::from(probe.to_string()),
                Cell::from(record.msg().unwrap_or(record.line.as_str()).to_string()).style(style),
            ])
        })
        .collect();

    let log_table = Table::new(
        log_rows,
        [
            Constraint::Length(10), // Time
            Constraint::Fill(1),    // Probe
            Constraint::Fill(4),    // Message
        ],
    )
    .header(
        Row::new(vec![Cell::from("Time"), Cell::from("Probe"), Cell::from("Message")])
            .height(1)
            .style(app.theme.header),
    )
    .block(
        Block::default()
            .title(format!(" Logs ({}) ", logs.len()))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(log_table, content_chunks[1]);

    // ===== FOOTER =====
    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " ←/→ select  Esc close ",
        Style::default().add_modifier(Modifier::DIM),
    )]));
    frame.render_widget(footer, chunks[2]);
}
