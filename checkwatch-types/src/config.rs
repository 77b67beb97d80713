//! Check schedule configuration history.

/// Execution interval of a check, effective from `date` onward.
///
/// A check's history is a sequence of these ordered by `date`; the first one
/// carries the check's creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckConfig {
    /// Interval between executions in milliseconds.
    pub frequency: i64,
    /// Unix timestamp in milliseconds from which this interval applies.
    pub date: i64,
}

impl CheckConfig {
    pub const fn new(frequency: i64, date: i64) -> Self {
        Self { frequency, date }
    }

    /// A config can only drive a schedule if its frequency is positive.
    pub const fn is_valid(&self) -> bool {
        self.frequency > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        assert!(CheckConfig::new(1, 0).is_valid());
        assert!(!CheckConfig::new(0, 0).is_valid());
        assert!(!CheckConfig::new(-5, 0).is_valid());
    }
}
