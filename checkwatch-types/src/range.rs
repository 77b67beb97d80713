//! Time and index ranges.

/// An inclusive range of Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

impl TimeRange {
    pub const fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    /// A range ending at `to` and spanning `span_ms` milliseconds.
    pub const fn ending_at(to: i64, span_ms: i64) -> Self {
        Self {
            from: to - span_ms,
            to,
        }
    }

    pub const fn contains(&self, instant: i64) -> bool {
        self.from <= instant && instant <= self.to
    }

    /// True when `from` is after `to`.
    pub const fn is_empty(&self) -> bool {
        self.from > self.to
    }

    pub const fn span(&self) -> i64 {
        self.to - self.from
    }
}

/// An inclusive range over timepoint indices.
///
/// Used for minimap pages and sections. Always `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexRange {
    pub start: usize,
    pub end: usize,
}

/// A display window over the timepoint grid.
pub type MiniMapPage = IndexRange;

/// A sub-range of a [`MiniMapPage`].
pub type MiniMapSection = IndexRange;

impl IndexRange {
    /// Create a range. Bounds are swapped if given in reverse.
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Number of indices covered.
    pub const fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Never true; present for API symmetry with `len`.
    pub const fn is_empty(&self) -> bool {
        false
    }

    pub const fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    /// Number of indices shared with `other`.
    pub fn overlap(&self, other: &IndexRange) -> usize {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start > end {
            0
        } else {
            end - start + 1
        }
    }
}

impl From<(usize, usize)> for IndexRange {
    fn from((start, end): (usize, usize)) -> Self {
        Self::new(start, end)
    }
}
