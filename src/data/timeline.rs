//! The full reconstruction pipeline for one check.

use std::collections::BTreeMap;

use checkwatch_types::{
    AnnotationWithIndices, CheckConfig, CheckEvent, ParsedLogRecord, StatefulTimepoint,
    StatelessTimepoint, TimeRange,
};
use tracing::{debug, info};

use super::annotations::{build_check_events, get_closest_timepoints_to_check_event};
use super::error::TimelineError;
use super::frame::RawLogFrame;
use super::grouping::{group_executions, Execution, ExecutionMarkers};
use super::projection::project_timepoints;
use super::records::{dedupe_records, flatten_frames, ColumnTransforms};

/// 31 days, the usual log retention.
pub const DEFAULT_RETENTION_MS: i64 = 31 * 24 * 60 * 60 * 1000;

/// Knobs for [`Timeline::build`].
#[derive(Debug, Clone)]
pub struct TimelineOptions {
    pub markers: ExecutionMarkers,
    pub transforms: ColumnTransforms,
    pub retention_ms: i64,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            markers: ExecutionMarkers::default(),
            transforms: ColumnTransforms::standard(),
            retention_ms: DEFAULT_RETENTION_MS,
        }
    }
}

/// Everything derived from one set of frames and config history.
///
/// Projection and annotation placement depend on what is visible, so they
/// are computed on demand for a slice of [`Timeline::timepoints`].
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    records: Vec<ParsedLogRecord>,
    executions: BTreeMap<String, Vec<Execution>>,
    timepoints: Vec<StatelessTimepoint>,
    events: Vec<CheckEvent>,
    markers: ExecutionMarkers,
    range: TimeRange,
    now: i64,
}

impl Timeline {
    /// Run the pipeline from raw frames.
    pub fn build(
        frames: &[RawLogFrame],
        configs: &[CheckConfig],
        range: TimeRange,
        now: i64,
        options: &TimelineOptions,
    ) -> Result<Self, TimelineError> {
        let records = flatten_frames(frames, &options.transforms)?;
        debug!(frames = frames.len(), records = records.len(), "flattened log frames");
        Self::from_records(records, configs, range, now, options)
    }

    /// Run the pipeline from records already sorted by `ts_ns`.
    pub fn from_records(
        records: Vec<ParsedLogRecord>,
        configs: &[CheckConfig],
        range: TimeRange,
        now: i64,
        options: &TimelineOptions,
    ) -> Result<Self, TimelineError> {
        let records = dedupe_records(records);
        let executions = group_executions(&records, &options.markers);
        let timepoints = super::timepoints::build_timepoints(configs, range.from, range.to)?;
        let events = build_check_events(configs, range, now, options.retention_ms);

        info!(
            records = records.len(),
            probes = executions.len(),
            executions = executions.values().map(Vec::len).sum::<usize>(),
            timepoints = timepoints.len(),
            events = events.len(),
            "timeline built"
        );

        Ok(Self {
            records,
            executions,
            timepoints,
            events,
            markers: options.markers.clone(),
            range,
            now,
        })
    }

    pub fn records(&self) -> &[ParsedLogRecord] {
        &self.records
    }

    pub fn executions(&self) -> &BTreeMap<String, Vec<Execution>> {
        &self.executions
    }

    /// The full schedule grid, earliest first.
    pub fn timepoints(&self) -> &[StatelessTimepoint] {
        &self.timepoints
    }

    pub fn events(&self) -> &[CheckEvent] {
        &self.events
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn markers(&self) -> &ExecutionMarkers {
        &self.markers
    }

    /// Probe names seen in the logs.
    pub fn probes(&self) -> impl Iterator<Item = &str> {
        self.executions.keys().map(String::as_str)
    }

    /// Status and results for `visible`.
    pub fn project(&self, visible: &[StatelessTimepoint]) -> Vec<StatefulTimepoint> {
        project_timepoints(visible, &self.executions, &self.markers, self.now)
    }

    /// Status and results for the whole grid.
    pub fn project_all(&self) -> Vec<StatefulTimepoint> {
        self.project(&self.timepoints)
    }

    /// Lifecycle annotations placed onto `visible`.
    pub fn annotations(&self, visible: &[StatelessTimepoint]) -> Vec<AnnotationWithIndices> {
        get_closest_timepoints_to_check_event(&self.events, visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkwatch_types::TimepointStatus;
    use serde_json::json;

    fn frames() -> Vec<RawLogFrame> {
        let rows = [
            (1_000, "Paris", "Beginning check", None),
            (1_200, "Paris", "Check succeeded", Some("0.2")),
            (2_000, "Paris", "Beginning check", None),
            (2_300, "Paris", "Check failed", Some("0.3")),
            (3_000, "Paris", "Beginning check", None),
        ];
        let labels = rows.iter().map(|(_, probe, msg, duration)| {
            let mut labels = json!({"probe": probe, "msg": msg});
            if let Some(d) = duration {
                labels["duration_seconds"] = json!(d);
            }
            labels
        });

        vec![RawLogFrame::builder()
            .field("labels", labels)
            .field("time", rows.iter().map(|r| r.0))
            .field("line", rows.iter().map(|r| r.2))
            .build()]
    }

    #[test]
    fn test_pipeline() {
        let configs = [CheckConfig::new(1_000, 1_000)];
        let timeline = Timeline::build(
            &frames(),
            &configs,
            TimeRange::new(1_000, 4_000),
            3_500,
            &TimelineOptions::default(),
        )
        .unwrap();

        assert_eq!(timeline.records().len(), 5);
        assert_eq!(timeline.executions()["Paris"].len(), 2);
        assert_eq!(timeline.timepoints().len(), 4);

        let statuses: Vec<TimepointStatus> =
            timeline.project_all().iter().map(|tp| tp.status).collect();
        assert_eq!(
            statuses,
            vec![
                TimepointStatus::Success,
                TimepointStatus::Failure,
                TimepointStatus::Pending,
                TimepointStatus::Pending,
            ]
        );

        let annotations = timeline.annotations(timeline.timepoints());
        assert!(annotations.iter().any(|a| a.is_instant && a.visible_start_index == 0));
    }

    #[test]
    fn test_build_is_idempotent() {
        let configs = [CheckConfig::new(1_000, 0)];
        let range = TimeRange::new(0, 5_000);
        let options = TimelineOptions::default();

        let a = Timeline::build(&frames(), &configs, range, 10_000, &options).unwrap();
        let b = Timeline::build(&frames(), &configs, range, 10_000, &options).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.project_all(), b.project_all());
    }

    #[test]
    fn test_invalid_config_fails_build() {
        let configs = [CheckConfig::new(-5, 0)];
        let err = Timeline::build(&frames(), &configs, TimeRange::new(0, 1), 0, &TimelineOptions::default())
            .unwrap_err();
        assert!(matches!(err, TimelineError::InvalidConfig { .. }));
    }
}
