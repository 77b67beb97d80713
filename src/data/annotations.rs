//! Check lifecycle events and their placement on the visible timeline.

use checkwatch_types::{
    AnnotationWithIndices, CheckConfig, CheckEvent, CheckEventLabel, StatelessTimepoint, TimeRange,
};

/// Derive lifecycle events for a check over `range`.
///
/// `retention_ms` is how far back logs are kept; anything older than
/// `now - retention_ms` is marked as out of the retention period.
pub fn build_check_events(
    configs: &[CheckConfig],
    range: TimeRange,
    now: i64,
    retention_ms: i64,
) -> Vec<CheckEvent> {
    let mut dates: Vec<i64> = configs.iter().map(|c| c.date).collect();
    dates.sort_unstable();

    let mut events = Vec::new();
    if let Some((&created, updates)) = dates.split_first() {
        events.push(CheckEvent::instant(CheckEventLabel::CheckCreated, created));
        events.extend(
            updates
                .iter()
                .map(|&date| CheckEvent::instant(CheckEventLabel::CheckUpdated, date)),
        );
        if range.from < created {
            events.push(CheckEvent::range(
                CheckEventLabel::BeforeCreation,
                Some(range.from),
                Some(created.min(range.to)),
            ));
        }
    }

    let retention_edge = now.saturating_sub(retention_ms);
    if range.from < retention_edge {
        events.push(CheckEvent::range(
            CheckEventLabel::OutOfRetentionPeriod,
            Some(range.from),
            Some(retention_edge.min(range.to)),
        ));
    }

    if range.to > now {
        events.push(CheckEvent::range(
            CheckEventLabel::OutOfTimeRange,
            Some(now.max(range.from)),
            Some(range.to),
        ));
    }

    events
}

/// Events that touch the span of `visible`, inclusive at both ends.
///
/// The span runs from the first timepoint's start to the end of the last
/// timepoint's window.
pub fn get_check_events_in_range(
    events: &[CheckEvent],
    visible: &[StatelessTimepoint],
) -> Vec<CheckEvent> {
    let (Some(first), Some(last)) = (visible.first(), visible.last()) else {
        return Vec::new();
    };

    events
        .iter()
        .filter(|event| {
            event.start_bound() <= last.end_time() && event.end_bound() >= first.adjusted_time
        })
        .cloned()
        .collect()
}

/// Place each event that touches `visible` onto slice positions.
///
/// The start index is the first timepoint whose window ends after the event
/// starts, the end index the last timepoint starting at or before the event
/// ends. A bound outside the visible span is clipped to the slice edge.
pub fn get_closest_timepoints_to_check_event(
    events: &[CheckEvent],
    visible: &[StatelessTimepoint],
) -> Vec<AnnotationWithIndices> {
    let (Some(first), Some(last)) = (visible.first(), visible.last()) else {
        return Vec::new();
    };
    let last_index = visible.len() - 1;

    get_check_events_in_range(events, visible)
        .into_iter()
        .map(|event| {
            let is_clipped_start = event.from.is_none_or(|from| from < first.adjusted_time);
            let is_clipped_end = event.to.is_none_or(|to| to > last.end_time());

            let start = match event.from {
                Some(from) if !is_clipped_start => {
                    visible.partition_point(|tp| tp.end_time() <= from).min(last_index)
                }
                _ => 0,
            };
            let end = match event.to {
                Some(to) if !is_clipped_end => visible
                    .partition_point(|tp| tp.adjusted_time <= to)
                    .saturating_sub(1)
                    .max(start),
                _ => last_index,
            };

            let is_instant = event.is_instant();
            AnnotationWithIndices {
                is_clipped_start,
                is_clipped_end,
                is_instant,
                visible_start_index: start,
                visible_end_index: if is_instant { start } else { end },
                event,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible(times: &[i64], duration: i64) -> Vec<StatelessTimepoint> {
        times
            .iter()
            .enumerate()
            .map(|(index, &adjusted_time)| StatelessTimepoint {
                adjusted_time,
                config: CheckConfig::new(duration, 0),
                timepoint_duration: duration,
                index: index + 100,
            })
            .collect()
    }

    #[test]
    fn test_clipped_start_only() {
        let tps = visible(&[30_000, 40_000, 50_000], 10_000);
        let event = CheckEvent::range(CheckEventLabel::BeforeCreation, Some(10_000), Some(40_001));

        let placed = get_closest_timepoints_to_check_event(&[event], &tps);
        assert_eq!(placed.len(), 1);
        assert!(placed[0].is_clipped_start);
        assert!(!placed[0].is_clipped_end);
        assert_eq!(placed[0].visible_start_index, 0);
        assert_eq!(placed[0].visible_end_index, 1);
    }

    #[test]
    fn test_range_is_inclusive_at_both_ends() {
        let tps = visible(&[30_000, 40_000], 10_000);
        let touching_start = CheckEvent::range(CheckEventLabel::BeforeCreation, Some(0), Some(30_000));
        let touching_end = CheckEvent::instant(CheckEventLabel::CheckUpdated, 50_000);
        let before = CheckEvent::range(CheckEventLabel::BeforeCreation, Some(0), Some(29_999));
        let after = CheckEvent::instant(CheckEventLabel::CheckUpdated, 50_001);

        let kept = get_check_events_in_range(&[touching_start, touching_end, before, after], &tps);
        assert_eq!(kept.len(), 2);
        assert!(get_check_events_in_range(&kept, &[]).is_empty());
    }

    #[test]
    fn test_instant_inside_window() {
        let tps = visible(&[30_000, 40_000, 50_000], 10_000);
        let event = CheckEvent::instant(CheckEventLabel::CheckUpdated, 45_000);

        let placed = get_closest_timepoints_to_check_event(&[event], &tps);
        assert!(placed[0].is_instant);
        assert!(!placed[0].is_clipped_start);
        assert!(!placed[0].is_clipped_end);
        assert_eq!((placed[0].visible_start_index, placed[0].visible_end_index), (1, 1));
    }

    #[test]
    fn test_open_bounds_clip_both_ends() {
        let tps = visible(&[30_000, 40_000, 50_000], 10_000);
        let event = CheckEvent::range(CheckEventLabel::OutOfRetentionPeriod, None, None);

        let placed = get_closest_timepoints_to_check_event(&[event], &tps);
        assert!(placed[0].is_clipped_start && placed[0].is_clipped_end);
        assert_eq!((placed[0].visible_start_index, placed[0].visible_end_index), (0, 2));
    }

    #[test]
    fn test_build_check_events() {
        let configs = [CheckConfig::new(60_000, 5_000), CheckConfig::new(30_000, 8_000)];
        let range = TimeRange::new(1_000, 20_000);
        let events = build_check_events(&configs, range, 15_000, 12_000);

        let labels: Vec<CheckEventLabel> = events.iter().map(|e| e.label).collect();
        assert_eq!(
            labels,
            vec![
                CheckEventLabel::CheckCreated,
                CheckEventLabel::CheckUpdated,
                CheckEventLabel::BeforeCreation,
                CheckEventLabel::OutOfRetentionPeriod,
                CheckEventLabel::OutOfTimeRange,
            ]
        );
        assert_eq!(events[0].from, Some(5_000));
        assert_eq!((events[2].from, events[2].to), (Some(1_000), Some(5_000)));
        assert_eq!((events[3].from, events[3].to), (Some(1_000), Some(3_000)));
        assert_eq!((events[4].from, events[4].to), (Some(15_000), Some(20_000)));
        assert_eq!(events[4].color, CheckEventLabel::OutOfTimeRange.color());
    }

    #[test]
    fn test_build_check_events_inside_history() {
        let configs = [CheckConfig::new(60_000, 0)];
        let events = build_check_events(&configs, TimeRange::new(1_000, 2_000), 5_000, 100_000);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].label, CheckEventLabel::CheckCreated);
    }
}
