//! Grouping log records into per-probe check executions.
//!
//! A probe logs a start marker when it begins running a check, possibly some
//! intermediate lines, and a terminal marker when it finishes. Grouping
//! splits the sorted record stream on start markers, then trims the runs at
//! the edges of the queried range that were only partially captured.

use std::collections::BTreeMap;

use checkwatch_types::ParsedLogRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The `msg` vocabulary that identifies execution boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionMarkers {
    pub start: Vec<String>,
    pub success: Vec<String>,
    pub failure: Vec<String>,
}

impl Default for ExecutionMarkers {
    fn default() -> Self {
        Self {
            start: vec!["Beginning check".to_string()],
            success: vec!["Check succeeded".to_string()],
            failure: vec!["Check failed".to_string()],
        }
    }
}

impl ExecutionMarkers {
    /// Classify a record by its `msg` label.
    pub fn role(&self, record: &ParsedLogRecord) -> LogRole {
        let Some(msg) = record.msg() else {
            return LogRole::Intermediate;
        };
        if self.start.iter().any(|m| m == msg) {
            LogRole::Starting
        } else if self.success.iter().any(|m| m == msg) {
            LogRole::Succeeded
        } else if self.failure.iter().any(|m| m == msg) {
            LogRole::Failed
        } else {
            LogRole::Intermediate
        }
    }

    /// Success and failure markers together.
    pub fn terminal(&self) -> Vec<String> {
        self.success.iter().chain(&self.failure).cloned().collect()
    }
}

/// Lifecycle role of a single log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRole {
    Starting,
    Succeeded,
    Failed,
    Intermediate,
}

impl LogRole {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LogRole::Succeeded | LogRole::Failed)
    }
}

/// The ordered records of one check run on one probe. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    logs: Vec<ParsedLogRecord>,
}

impl Execution {
    /// Wrap a run of records. Returns `None` for an empty run.
    pub fn new(logs: Vec<ParsedLogRecord>) -> Option<Self> {
        if logs.is_empty() {
            None
        } else {
            Some(Self { logs })
        }
    }

    pub fn logs(&self) -> &[ParsedLogRecord] {
        &self.logs
    }

    /// Millisecond timestamp of the first record.
    pub fn start_time(&self) -> i64 {
        self.logs[0].time
    }

    pub fn probe(&self) -> Option<&str> {
        self.logs[0].probe()
    }

    /// Whether any record carries one of `msgs`.
    pub fn contains_msg(&self, msgs: &[String]) -> bool {
        self.logs.iter().any(|r| r.msg().is_some_and(|m| msgs.iter().any(|x| x == m)))
    }

    /// The last terminal record, if the run finished.
    pub fn terminal<'a>(&'a self, markers: &ExecutionMarkers) -> Option<&'a ParsedLogRecord> {
        self.logs.iter().rev().find(|r| markers.role(r).is_terminal())
    }

    /// `Succeeded` or `Failed`, if the run finished.
    pub fn outcome(&self, markers: &ExecutionMarkers) -> Option<LogRole> {
        self.terminal(markers).map(|r| markers.role(r))
    }

    /// Reported duration in milliseconds, from the terminal record.
    pub fn duration_ms(&self, markers: &ExecutionMarkers) -> Option<i64> {
        let seconds = self.terminal(markers)?.labels.duration_seconds()?;
        Some((seconds * 1000.0).round() as i64)
    }
}

/// Partition records by probe, preserving order within each probe.
///
/// Records without a `probe` label cannot be attributed and are skipped.
pub fn group_by_probe(records: &[ParsedLogRecord]) -> BTreeMap<String, Vec<ParsedLogRecord>> {
    let mut by_probe: BTreeMap<String, Vec<ParsedLogRecord>> = BTreeMap::new();
    let mut unattributed = 0usize;

    for record in records {
        match record.probe() {
            Some(probe) => by_probe.entry(probe.to_string()).or_default().push(record.clone()),
            None => unattributed += 1,
        }
    }

    if unattributed > 0 {
        debug!(unattributed, "skipped log records without a probe label");
    }
    by_probe
}

/// Split one probe's records into runs that each begin at a start marker.
///
/// Records before the first start marker form a leading run of their own so
/// that [`discard_incomplete_checks`] can drop it.
pub fn group_by_execution(records: Vec<ParsedLogRecord>, start_msgs: &[String]) -> Vec<Execution> {
    let mut executions = Vec::new();
    let mut current: Vec<ParsedLogRecord> = Vec::new();

    for record in records {
        let is_start = record.msg().is_some_and(|m| start_msgs.iter().any(|s| s == m));
        if is_start && !current.is_empty() {
            executions.extend(Execution::new(std::mem::take(&mut current)));
        }
        current.push(record);
    }
    executions.extend(Execution::new(current));

    executions
}

/// Drop the edge run that lacks any of `match_msgs`.
///
/// Looks at the first run, or the last one when `reverse` is set. Only that
/// one run is considered; incomplete runs in the interior are kept.
pub fn discard_incomplete_checks(
    mut executions: Vec<Execution>,
    match_msgs: &[String],
    reverse: bool,
) -> Vec<Execution> {
    let edge = if reverse {
        executions.len().checked_sub(1)
    } else if executions.is_empty() {
        None
    } else {
        Some(0)
    };

    if let Some(index) = edge {
        if !executions[index].contains_msg(match_msgs) {
            let dropped = executions.remove(index);
            debug!(
                probe = dropped.probe().unwrap_or_default(),
                records = dropped.logs().len(),
                trailing = reverse,
                "discarded partially captured execution"
            );
        }
    }
    executions
}

/// Full grouping: probe, then execution, then both edge trims.
pub fn group_executions(
    records: &[ParsedLogRecord],
    markers: &ExecutionMarkers,
) -> BTreeMap<String, Vec<Execution>> {
    let terminal = markers.terminal();

    group_by_probe(records)
        .into_iter()
        .map(|(probe, logs)| {
            let runs = group_by_execution(logs, &markers.start);
            let runs = discard_incomplete_checks(runs, &markers.start, false);
            let runs = discard_incomplete_checks(runs, &terminal, true);
            (probe, runs)
        })
        .filter(|(_, runs)| !runs.is_empty())
        .collect()
}
