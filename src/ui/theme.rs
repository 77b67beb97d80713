//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use checkwatch_types::{CheckEvent, TimepointStatus};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    pub success: Color,
    pub failure: Color,
    pub missing: Color,
    pub pending: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for the selected timepoint.
    pub selected: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            success: Color::Green,
            failure: Color::Red,
            missing: Color::DarkGray,
            pending: Color::Yellow,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            success: Color::Green,
            failure: Color::Red,
            missing: Color::Gray,
            pending: Color::Yellow,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn status_color(&self, status: TimepointStatus) -> Color {
        match status {
            TimepointStatus::Success => self.success,
            TimepointStatus::Failure => self.failure,
            TimepointStatus::Missing => self.missing,
            TimepointStatus::Pending => self.pending,
        }
    }

    /// Get style for a timepoint status
    pub fn status_style(&self, status: TimepointStatus) -> Style {
        let style = Style::default().fg(self.status_color(status));
        if status == TimepointStatus::Failure {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }

    /// The event's own color, or the border color if it does not parse.
    pub fn event_color(&self, event: &CheckEvent) -> Color {
        event.color.parse().unwrap_or(self.border)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkwatch_types::CheckEventLabel;

    #[test]
    fn test_event_color_parses_hex() {
        let theme = Theme::dark();
        let event = CheckEvent::instant(CheckEventLabel::CheckCreated, 0);
        assert_eq!(theme.event_color(&event), Color::Rgb(0x73, 0xbf, 0x69));

        let mut odd = event.clone();
        odd.color = "not a color".to_string();
        assert_eq!(theme.event_color(&odd), theme.border);
    }
}
