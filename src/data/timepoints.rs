//! Building the idealized schedule grid from a check's config history.

use checkwatch_types::{CheckConfig, StatelessTimepoint};
use tracing::debug;

use super::error::TimelineError;

/// Expected execution instants in `[from, to]`.
///
/// Configs are applied in `date` order; each one generates instants at its
/// `frequency` starting from `max(from, date)` and stops at the next config's
/// `date` (exclusive) or at `to` (inclusive). Indices are dense from 0.
///
/// Every config must have a positive frequency, even ones outside the range,
/// since a history containing a zero interval is corrupt as a whole.
pub fn build_timepoints(
    configs: &[CheckConfig],
    from: i64,
    to: i64,
) -> Result<Vec<StatelessTimepoint>, TimelineError> {
    if let Some(bad) = configs.iter().find(|c| !c.is_valid()) {
        return Err(TimelineError::InvalidConfig {
            frequency: bad.frequency,
            date: bad.date,
        });
    }
    if from > to {
        return Ok(Vec::new());
    }

    let mut sorted = configs.to_vec();
    sorted.sort_by_key(|c| c.date);

    let mut timepoints = Vec::new();
    for (i, config) in sorted.iter().enumerate() {
        let next_date = sorted.get(i + 1).map(|next| next.date);
        if next_date.is_some_and(|next| next <= from) {
            continue;
        }
        if config.date > to {
            break;
        }

        let mut t = from.max(config.date);
        while t <= to && next_date.is_none_or(|next| t < next) {
            timepoints.push(StatelessTimepoint {
                adjusted_time: t,
                config: *config,
                timepoint_duration: config.frequency,
                index: timepoints.len(),
            });
            match t.checked_add(config.frequency) {
                Some(next) => t = next,
                None => break,
            }
        }
    }

    debug!(
        configs = configs.len(),
        timepoints = timepoints.len(),
        from,
        to,
        "built timepoint grid"
    );
    Ok(timepoints)
}

/// Position of the timepoint whose window covers `instant`, if any.
///
/// `timepoints` must be sorted by `adjusted_time`, as [`build_timepoints`]
/// returns them.
pub fn timepoint_position(timepoints: &[StatelessTimepoint], instant: i64) -> Option<usize> {
    let after = timepoints.partition_point(|tp| tp.adjusted_time <= instant);
    let candidate = after.checked_sub(1)?;
    timepoints[candidate].covers(instant).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(timepoints: &[StatelessTimepoint]) -> Vec<i64> {
        timepoints.iter().map(|tp| tp.adjusted_time).collect()
    }

    #[test]
    fn test_single_config() {
        let configs = [CheckConfig::new(1_000, 0)];
        let grid = build_timepoints(&configs, 2_000, 5_000).unwrap();
        assert_eq!(times(&grid), vec![2_000, 3_000, 4_000, 5_000]);
        assert!(grid.iter().enumerate().all(|(i, tp)| tp.index == i));
        assert!(grid.iter().all(|tp| tp.timepoint_duration == 1_000));
    }

    #[test]
    fn test_frequency_change_mid_range() {
        let configs = [CheckConfig::new(500, 3_000), CheckConfig::new(1_000, 0)];
        let grid = build_timepoints(&configs, 1_000, 4_000).unwrap();

        assert_eq!(times(&grid), vec![1_000, 2_000, 3_000, 3_500, 4_000]);
        assert_eq!(grid[1].config.frequency, 1_000);
        assert_eq!(grid[2].config.frequency, 500);
        assert_eq!(grid[4].index, 4);
    }

    #[test]
    fn test_grid_starts_at_creation() {
        let configs = [CheckConfig::new(1_000, 2_500)];
        let grid = build_timepoints(&configs, 0, 5_000).unwrap();
        assert_eq!(times(&grid), vec![2_500, 3_500, 4_500]);
    }

    #[test]
    fn test_superseded_config_is_skipped() {
        let configs = [CheckConfig::new(100, 0), CheckConfig::new(1_000, 500)];
        let grid = build_timepoints(&configs, 1_000, 3_000).unwrap();
        assert_eq!(times(&grid), vec![1_000, 2_000, 3_000]);
        assert!(grid.iter().all(|tp| tp.config.frequency == 1_000));
    }

    #[test]
    fn test_grid_stays_within_range() {
        let configs = [CheckConfig::new(700, 0), CheckConfig::new(300, 2_000)];
        let grid = build_timepoints(&configs, 100, 3_000).unwrap();

        assert!(grid.iter().all(|tp| (100..=3_000).contains(&tp.adjusted_time)));
        assert!(grid.windows(2).all(|w| w[0].adjusted_time < w[1].adjusted_time));
        for pair in grid.windows(2) {
            if pair[0].config == pair[1].config {
                assert_eq!(pair[1].adjusted_time - pair[0].adjusted_time, pair[0].config.frequency);
            }
        }
    }

    #[test]
    fn test_empty_cases() {
        assert!(build_timepoints(&[], 0, 10_000).unwrap().is_empty());
        let configs = [CheckConfig::new(1_000, 20_000)];
        assert!(build_timepoints(&configs, 0, 10_000).unwrap().is_empty());
        assert!(build_timepoints(&configs, 30_000, 25_000).unwrap().is_empty());
    }

    #[test]
    fn test_non_positive_frequency_is_invalid() {
        let configs = [CheckConfig::new(1_000, 0), CheckConfig::new(0, 5_000)];
        let err = build_timepoints(&configs, 0, 1_000).unwrap_err();
        assert_eq!(
            err,
            TimelineError::InvalidConfig {
                frequency: 0,
                date: 5_000
            }
        );
    }

    #[test]
    fn test_timepoint_position() {
        let configs = [CheckConfig::new(1_000, 0)];
        let grid = build_timepoints(&configs, 1_000, 3_000).unwrap();
        assert_eq!(timepoint_position(&grid, 999), None);
        assert_eq!(timepoint_position(&grid, 1_000), Some(0));
        assert_eq!(timepoint_position(&grid, 2_999), Some(1));
        assert_eq!(timepoint_position(&grid, 3_999), Some(2));
        assert_eq!(timepoint_position(&grid, 4_000), None);
    }
}
