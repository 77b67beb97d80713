//! Check lifecycle events drawn as annotations over the timeline.

/// Kind of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CheckEventLabel {
    /// The check was created.
    CheckCreated,
    /// The check's schedule changed.
    CheckUpdated,
    /// Time before the check existed.
    BeforeCreation,
    /// Time whose logs are no longer retained.
    OutOfRetentionPeriod,
    /// Time outside what can be observed yet.
    OutOfTimeRange,
}

impl CheckEventLabel {
    /// Default annotation color.
    pub fn color(&self) -> &'static str {
        match self {
            CheckEventLabel::CheckCreated => "#73bf69",
            CheckEventLabel::CheckUpdated => "#fade2a",
            CheckEventLabel::BeforeCreation => "#808080",
            CheckEventLabel::OutOfRetentionPeriod => "#5f5f5f",
            CheckEventLabel::OutOfTimeRange => "#404040",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CheckEventLabel::CheckCreated => "Check created",
            CheckEventLabel::CheckUpdated => "Check updated",
            CheckEventLabel::BeforeCreation => "Before creation",
            CheckEventLabel::OutOfRetentionPeriod => "Out of retention period",
            CheckEventLabel::OutOfTimeRange => "Out of time range",
        }
    }
}

/// A lifecycle event. `None` bounds are open-ended.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckEvent {
    pub label: CheckEventLabel,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub color: String,
}

impl CheckEvent {
    /// An event spanning `[from, to]`, colored by its label.
    pub fn range(label: CheckEventLabel, from: Option<i64>, to: Option<i64>) -> Self {
        Self {
            label,
            from,
            to,
            color: label.color().to_string(),
        }
    }

    /// An event at a single instant.
    pub fn instant(label: CheckEventLabel, at: i64) -> Self {
        Self::range(label, Some(at), Some(at))
    }

    pub fn is_instant(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if from == to)
    }

    /// Lower bound, `i64::MIN` when open.
    pub fn start_bound(&self) -> i64 {
        self.from.unwrap_or(i64::MIN)
    }

    /// Upper bound, `i64::MAX` when open.
    pub fn end_bound(&self) -> i64 {
        self.to.unwrap_or(i64::MAX)
    }
}

/// A [`CheckEvent`] placed onto the visible slice of the timeline.
///
/// Indices are positions within the visible slice, not grid indices.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AnnotationWithIndices {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub event: CheckEvent,
    pub is_clipped_start: bool,
    pub is_clipped_end: bool,
    pub is_instant: bool,
    pub visible_start_index: usize,
    pub visible_end_index: usize,
}
