//! Terminal UI rendering using ratatui.
//!
//! # Submodules
//!
//! - [`common`]: Header bar, status bar, help overlay
//! - [`timeline`]: Duration bars and the annotation row for the visible section
//! - [`minimap`]: Section strip for the current page
//! - [`detail`]: Per-probe results of the selected timepoint
//! - [`theme`]: Color themes (dark/light)
//!
//! # Rendering Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │ Header (check, status counts, refreshing) │
//! ├───────────────────────────────────────────┤
//! │ Minimap (page N/M, sections)              │
//! ├───────────────────────────────────────────┤
//! │                                           │
//! │ Timeline (bars, annotations, time axis)   │
//! │                                           │
//! ├───────────────────────────────────────────┤
//! │ Status bar (messages, controls)           │
//! └───────────────────────────────────────────┘
//! ```
//!
//! The help and detail overlays are drawn on top when active.

pub mod common;
pub mod detail;
pub mod minimap;
pub mod theme;
pub mod timeline;

pub use theme::Theme;

/// Format Unix milliseconds as `HH:MM:SS` in UTC.
pub(crate) fn format_clock(ms: i64) -> String {
    let secs = ms.div_euclid(1000).rem_euclid(86_400);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(3_723_000), "01:02:03");
        assert_eq!(format_clock(86_400_000 + 59_999), "00:00:59");
    }
}
