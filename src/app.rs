//! Application state and navigation logic.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use checkwatch_types::{
    AnnotationWithIndices, CheckConfig, ParsedLogRecord, StatefulTimepoint, StatelessTimepoint,
    TimeRange,
};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::data::projection::status_counts;
use crate::data::{
    dedupe_records, display_count_for_width, flatten_frames, max_probe_duration, RawLogFrame,
    Timeline, TimelineOptions, WindowReconciler,
};
use crate::source::{Clock, DataSource, LogQuery, PendingRefresh, RefreshController, SourceUpdate};
use crate::ui::Theme;

/// Columns taken by the timeline block's borders.
const TIMELINE_CHROME: u16 = 2;

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub show_detail_overlay: bool,

    // Inputs
    sources: Vec<Box<dyn DataSource>>,
    clock: Arc<dyn Clock>,
    frames: Vec<RawLogFrame>,
    /// Re-fetched records, sorted and without duplicates.
    refreshed: Vec<ParsedLogRecord>,
    configs: Vec<CheckConfig>,

    // Derived
    options: TimelineOptions,
    range_ms: i64,
    pub timeline: Option<Timeline>,
    pub load_error: Option<String>,

    // Navigation state
    pub window: WindowReconciler,
    /// Position of the selected timepoint within the visible slice.
    pub selected: usize,
    cell_width: u16,

    // Pending re-fetch
    refresh: Option<RefreshController>,
    query: LogQuery,

    // UI
    pub theme: Theme,
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create an app reading from `sources`, configured by `settings`.
    pub fn new(sources: Vec<Box<dyn DataSource>>, clock: Arc<dyn Clock>, settings: &Settings) -> Result<Self> {
        Ok(Self {
            running: true,
            show_help: false,
            show_detail_overlay: false,
            sources,
            clock,
            frames: Vec::new(),
            refreshed: Vec::new(),
            configs: Vec::new(),
            options: settings.timeline_options()?,
            range_ms: settings.range_ms()?,
            timeline: None,
            load_error: None,
            window: WindowReconciler::new(0, 1, settings.timeline.sections_per_page),
            selected: 0,
            cell_width: settings.timeline.cell_width,
            refresh: None,
            query: settings.log_query(),
            theme: Theme::dark(),
            status_message: None,
        })
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Attach a pending refresh controller and the source it feeds.
    pub fn with_refresh(mut self, controller: RefreshController, updates: Box<dyn DataSource>) -> Self {
        self.refresh = Some(controller);
        self.sources.push(updates);
        self
    }

    /// Returns a description of the primary data source.
    pub fn source_description(&self) -> &str {
        self.sources.first().map_or("no source", |s| s.description())
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Terminal columns per timepoint.
    pub fn cell_width(&self) -> u16 {
        self.cell_width
    }

    /// Whether a re-fetch loop is running.
    pub fn is_refreshing(&self) -> bool {
        self.refresh.as_ref().is_some_and(|r| r.active().is_some())
    }

    /// Poll all sources and rebuild the timeline if anything arrived.
    ///
    /// Returns Ok(true) if new data was received, Ok(false) if no new data.
    pub fn reload_data(&mut self) -> Result<bool> {
        let mut changed = false;
        let mut source_error = None;

        for source in &mut self.sources {
            while let Some(update) = source.poll() {
                changed = true;
                match update {
                    SourceUpdate::Logs(frames) => {
                        self.frames = frames;
                        self.refreshed.clear();
                    }
                    SourceUpdate::Refresh(frame) => {
                        merge_refreshed(&mut self.refreshed, &frame, &self.options)
                    }
                    SourceUpdate::Configs(configs) => self.configs = configs,
                }
            }
            if source_error.is_none() {
                source_error = source.error().map(str::to_string);
            }
        }

        if changed {
            self.rebuild();
        }
        if let Some(err) = source_error {
            self.load_error = Some(err);
        }
        Ok(changed)
    }

    /// Recompute the timeline against the current time.
    pub fn rebuild(&mut self) {
        let now = self.clock.now_ms();
        let range = TimeRange::ending_at(now, self.range_ms);
        let built = flatten_frames(&self.frames, &self.options.transforms).and_then(|mut records| {
            records.extend(self.refreshed.iter().cloned());
            records.sort_by_key(|r| r.ts_ns);
            Timeline::from_records(records, &self.configs, range, now, &self.options)
        });

        match built {
            Ok(timeline) => {
                self.load_error = None;
                if self.timeline.as_ref() != Some(&timeline) {
                    self.window.set_total_count(timeline.timepoints().len());
                    self.timeline = Some(timeline);
                    self.clamp_selection();
                }
            }
            Err(e) => {
                warn!(error = %e, "timeline rebuild failed, keeping previous timeline");
                self.load_error = Some(e.to_string());
            }
        }
        self.sync_refresh();
    }

    /// Start, keep or stop the re-fetch loop to match what is visible.
    pub fn sync_refresh(&mut self) {
        let Some(controller) = self.refresh.as_mut() else {
            return;
        };
        let request = self.timeline.as_ref().and_then(|timeline| {
            let visible = timeline.project(self.window.visible_timepoints(timeline.timepoints()));
            PendingRefresh::from_timepoints(&visible, timeline.now(), &self.query, timeline.probes())
        });
        controller.sync(request);
    }

    /// Adopt a new terminal width.
    pub fn set_display_width(&mut self, width: u16) {
        let count = display_count_for_width(width.saturating_sub(TIMELINE_CHROME), self.cell_width);
        if self.window.set_display_count(count) {
            debug!(width, count, "display width changed");
            self.clamp_selection();
            self.sync_refresh();
        }
    }

    /// The visible slice of the grid.
    pub fn visible_timepoints(&self) -> &[StatelessTimepoint] {
        match &self.timeline {
            Some(timeline) => self.window.visible_timepoints(timeline.timepoints()),
            None => &[],
        }
    }

    pub fn visible_stateful(&self) -> Vec<StatefulTimepoint> {
        self.timeline
            .as_ref()
            .map(|t| t.project(self.visible_timepoints()))
            .unwrap_or_default()
    }

    pub fn visible_annotations(&self) -> Vec<AnnotationWithIndices> {
        self.timeline
            .as_ref()
            .map(|t| t.annotations(self.visible_timepoints()))
            .unwrap_or_default()
    }

    pub fn selected_timepoint(&self) -> Option<StatefulTimepoint> {
        let timeline = self.timeline.as_ref()?;
        let visible = self.visible_timepoints();
        let tp = visible.get(self.selected)?;
        timeline.project(std::slice::from_ref(tp)).pop()
    }

    /// Move the selection one timepoint back in time.
    pub fn select_older(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        } else if self.window.older_section() {
            self.selected = self.visible_timepoints().len().saturating_sub(1);
            self.sync_refresh();
        }
    }

    /// Move the selection one timepoint forward in time.
    pub fn select_newer(&mut self) {
        if self.selected + 1 < self.visible_timepoints().len() {
            self.selected += 1;
        } else if self.window.newer_section() {
            self.selected = 0;
            self.sync_refresh();
        }
    }

    pub fn older_section(&mut self) {
        if self.window.older_section() {
            self.after_navigation();
        }
    }

    pub fn newer_section(&mut self) {
        if self.window.newer_section() {
            self.after_navigation();
        }
    }

    pub fn older_page(&mut self) {
        if self.window.older_page() {
            self.after_navigation();
        }
    }

    pub fn newer_page(&mut self) {
        if self.window.newer_page() {
            self.after_navigation();
        }
    }

    pub fn jump_to_newest(&mut self) {
        self.window.jump_to_newest();
        self.selected = self.visible_timepoints().len().saturating_sub(1);
        self.sync_refresh();
    }

    pub fn jump_to_oldest(&mut self) {
        self.window.jump_to_oldest();
        self.selected = 0;
        self.sync_refresh();
    }

    fn after_navigation(&mut self) {
        self.clamp_selection();
        self.sync_refresh();
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_timepoints().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    /// Open the detail overlay for the selected timepoint.
    pub fn enter_detail(&mut self) {
        if !self.visible_timepoints().is_empty() {
            self.show_detail_overlay = true;
        }
    }

    /// Close whichever overlay is open.
    pub fn go_back(&mut self) {
        if self.show_detail_overlay {
            self.show_detail_overlay = false;
        } else {
            self.show_help = false;
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
        if let Some(controller) = self.refresh.as_mut() {
            controller.stop();
        }
    }

    /// Export the full projected timeline to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let Some(ref timeline) = self.timeline else {
            anyhow::bail!("No data to export");
        };
        write_export(timeline, path)
    }
}

/// Fold a re-fetched frame into the refreshed record set.
fn merge_refreshed(refreshed: &mut Vec<ParsedLogRecord>, frame: &RawLogFrame, options: &TimelineOptions) {
    match flatten_frames(std::slice::from_ref(frame), &options.transforms) {
        Ok(records) => {
            let mut merged = std::mem::take(refreshed);
            merged.extend(records);
            merged.sort_by_key(|r| r.ts_ns);
            *refreshed = dedupe_records(merged);
        }
        Err(e) => warn!(error = %e, "discarding unreadable refresh frame"),
    }
}

/// JSON document describing a whole timeline.
pub fn export_json(timeline: &Timeline) -> serde_json::Value {
    let timepoints = timeline.project_all();
    let counts = status_counts(&timepoints);
    let range = timeline.range();

    json!({
        "range": { "from": range.from, "to": range.to },
        "now": timeline.now(),
        "summary": {
            "timepoints": timepoints.len(),
            "probes": timeline.probes().collect::<Vec<_>>(),
            "status": counts.iter().map(|(s, n)| (s.label(), n)).collect::<std::collections::BTreeMap<_, _>>(),
            "max_probe_duration": max_probe_duration(&timepoints),
        },
        "timepoints": timepoints,
        "annotations": timeline.annotations(timeline.timepoints()),
    })
}

/// Write [`export_json`] pretty-printed to `path`.
pub fn write_export(timeline: &Timeline, path: &Path) -> Result<()> {
    let document = serde_json::to_string_pretty(&export_json(timeline))?;
    std::fs::write(path, document)?;
    Ok(())
}
