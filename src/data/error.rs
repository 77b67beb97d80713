//! Error types for timeline reconstruction.

use thiserror::Error;

/// Errors raised by the timeline engine.
///
/// Missing logs or configs are not errors; they surface as `missing` or
/// `pending` timepoints instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    /// A log frame is structurally invalid.
    #[error("Malformed log frame: {0}")]
    MalformedFrame(String),

    /// A check config cannot drive a schedule.
    #[error("Invalid check config effective from {date}: frequency must be positive, got {frequency}")]
    InvalidConfig { frequency: i64, date: i64 },
}

impl TimelineError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        TimelineError::MalformedFrame(reason.into())
    }
}
