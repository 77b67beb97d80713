//! Idealized execution instants and their observed state.

use std::collections::BTreeMap;

use crate::{CheckConfig, ParsedLogRecord};

/// One expected execution instant on the schedule grid.
///
/// The timepoint covers `[adjusted_time, adjusted_time + timepoint_duration)`;
/// an execution whose first record falls in that window belongs to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StatelessTimepoint {
    /// Unix milliseconds of the expected execution.
    pub adjusted_time: i64,
    /// The config in effect at this instant.
    pub config: CheckConfig,
    /// Width of the timepoint window in milliseconds.
    pub timepoint_duration: i64,
    /// Dense position in the full grid, 0 = earliest.
    pub index: usize,
}

impl StatelessTimepoint {
    /// Exclusive end of this timepoint's window.
    pub const fn end_time(&self) -> i64 {
        self.adjusted_time.saturating_add(self.timepoint_duration)
    }

    /// Whether `instant` falls inside `[adjusted_time, end_time)`.
    pub const fn covers(&self, instant: i64) -> bool {
        self.adjusted_time <= instant && instant < self.end_time()
    }
}

/// Derived status of a timepoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TimepointStatus {
    Success,
    Pending,
    Missing,
    Failure,
}

impl TimepointStatus {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            TimepointStatus::Success => "OK",
            TimepointStatus::Failure => "FAIL",
            TimepointStatus::Missing => "MISS",
            TimepointStatus::Pending => "PEND",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimepointStatus::Success => "success",
            TimepointStatus::Failure => "failure",
            TimepointStatus::Missing => "missing",
            TimepointStatus::Pending => "pending",
        }
    }
}

/// A timepoint merged with the executions observed for it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StatefulTimepoint {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub timepoint: StatelessTimepoint,
    /// Execution logs per probe name.
    pub probe_results: BTreeMap<String, Vec<ParsedLogRecord>>,
    pub status: TimepointStatus,
    /// Longest reported probe duration in milliseconds, 0 if none reported.
    pub max_probe_duration: i64,
}

impl StatefulTimepoint {
    pub fn adjusted_time(&self) -> i64 {
        self.timepoint.adjusted_time
    }

    pub fn index(&self) -> usize {
        self.timepoint.index
    }

    /// Names of the probes that produced an execution for this timepoint.
    pub fn probes(&self) -> impl Iterator<Item = &str> {
        self.probe_results.keys().map(String::as_str)
    }
}
