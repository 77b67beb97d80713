//! Projecting observed executions onto the schedule grid.

use std::collections::BTreeMap;

use checkwatch_types::{StatefulTimepoint, StatelessTimepoint, TimepointStatus};

use super::grouping::{Execution, ExecutionMarkers, LogRole};
use super::timepoints::timepoint_position;

/// Floor for the grid-wide duration scale, in milliseconds.
pub const MAX_PROBE_DURATION_DEFAULT: i64 = 1000;

/// Whether the timepoint has not started yet.
pub fn is_in_the_future(timepoint: &StatelessTimepoint, now: i64) -> bool {
    timepoint.adjusted_time > now
}

/// Whether results for the timepoint may still arrive.
///
/// True for future timepoints and for those at most one timepoint duration
/// in the past.
pub fn is_pending(timepoint: &StatelessTimepoint, now: i64) -> bool {
    is_in_the_future(timepoint, now)
        || now.saturating_sub(timepoint.adjusted_time) <= timepoint.timepoint_duration
}

/// Merge grouped executions into the given timepoints.
///
/// An execution belongs to the timepoint whose window contains its start
/// time. When a probe ran more than once inside one window the earliest run
/// is kept. `timepoints` must be sorted by `adjusted_time`.
pub fn project_timepoints(
    timepoints: &[StatelessTimepoint],
    executions: &BTreeMap<String, Vec<Execution>>,
    markers: &ExecutionMarkers,
    now: i64,
) -> Vec<StatefulTimepoint> {
    let mut assigned: Vec<BTreeMap<&str, &Execution>> = vec![BTreeMap::new(); timepoints.len()];

    for (probe, runs) in executions {
        for run in runs {
            if let Some(position) = timepoint_position(timepoints, run.start_time()) {
                assigned[position].entry(probe.as_str()).or_insert(run);
            }
        }
    }

    timepoints
        .iter()
        .zip(assigned)
        .map(|(timepoint, runs)| stateful(timepoint, &runs, markers, now))
        .collect()
}

/// The duration scale for a set of timepoints: their longest probe duration,
/// but never below [`MAX_PROBE_DURATION_DEFAULT`].
pub fn max_probe_duration(timepoints: &[StatefulTimepoint]) -> i64 {
    timepoints
        .iter()
        .map(|tp| tp.max_probe_duration)
        .max()
        .unwrap_or(0)
        .max(MAX_PROBE_DURATION_DEFAULT)
}

/// Count of timepoints per status.
pub fn status_counts(timepoints: &[StatefulTimepoint]) -> BTreeMap<TimepointStatus, usize> {
    let mut counts = BTreeMap::new();
    for tp in timepoints {
        *counts.entry(tp.status).or_insert(0) += 1;
    }
    counts
}

fn stateful(
    timepoint: &StatelessTimepoint,
    runs: &BTreeMap<&str, &Execution>,
    markers: &ExecutionMarkers,
    now: i64,
) -> StatefulTimepoint {
    let outcomes: Vec<LogRole> = runs.values().filter_map(|run| run.outcome(markers)).collect();

    let status = if outcomes.is_empty() {
        if is_pending(timepoint, now) {
            TimepointStatus::Pending
        } else {
            TimepointStatus::Missing
        }
    } else if outcomes.contains(&LogRole::Failed) {
        TimepointStatus::Failure
    } else {
        TimepointStatus::Success
    };

    let max_probe_duration = runs
        .values()
        .filter_map(|run| run.duration_ms(markers))
        .max()
        .unwrap_or(0);

    StatefulTimepoint {
        timepoint: *timepoint,
        probe_results: runs
            .iter()
            .map(|(probe, run)| (probe.to_string(), run.logs().to_vec()))
            .collect(),
        status,
        max_probe_duration,
    }
}
