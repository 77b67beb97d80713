//! Bounded re-fetching of logs for pending timepoints.
//!
//! A timepoint is pending while its results may still arrive. The viewer
//! derives a [`PendingRefresh`] from what it shows and hands it to the
//! [`RefreshController`], which keeps one background loop fetching that
//! range until the timepoints settle or the attempts run out.
//!
//! The grid is anchored at the start of the viewed range, so a request
//! derived a second later covers a slightly shifted range. Such a request
//! continues the running loop rather than replacing it.

use std::sync::Arc;
use std::time::Duration;

use checkwatch_types::{StatefulTimepoint, TimeRange, TimepointStatus};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ChannelSource, Clock, LogQuery, LogSource, SourceUpdate};

/// What to re-fetch and until when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRefresh {
    pub query: LogQuery,
    pub range: TimeRange,
    /// The last instant at which any covered timepoint is still pending.
    pub pending_until: i64,
}

impl PendingRefresh {
    /// Derive a request from projected timepoints.
    ///
    /// Only pending timepoints that have already started are covered; future
    /// ones have nothing to fetch yet. Returns `None` when there are none.
    pub fn from_timepoints<'a>(
        timepoints: &[StatefulTimepoint],
        now: i64,
        base: &LogQuery,
        probes: impl IntoIterator<Item = &'a str>,
    ) -> Option<Self> {
        let started: Vec<&StatefulTimepoint> = timepoints
            .iter()
            .filter(|tp| tp.status == TimepointStatus::Pending && tp.adjusted_time() <= now)
            .collect();

        let from = started.iter().map(|tp| tp.adjusted_time()).min()?;
        let to = started.iter().map(|tp| tp.timepoint.end_time()).max()?;
        let pending_until = to;

        Some(Self {
            query: base.clone().with_probes(probes),
            range: TimeRange::new(from, to),
            pending_until,
        })
    }

    /// Whether `next` asks for the same logs over an overlapping range.
    pub fn continues(&self, next: &PendingRefresh) -> bool {
        self.query == next.query
            && self.range.from < next.range.to
            && next.range.from < self.range.to
    }
}

/// Handle to a running refresh loop.
///
/// Call `stop()` to end the loop; dropping the handle also ends it.
#[derive(Debug)]
pub struct RefreshHandle {
    stop_tx: watch::Sender<bool>,
    request_tx: watch::Sender<PendingRefresh>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop the loop.
    pub fn stop(self) {
        let _ = self.stop_tx.send(true);
    }

    /// Retarget the loop. The attempt count carries over.
    pub fn update(&self, request: PendingRefresh) {
        self.request_tx.send_replace(request);
    }

    /// Whether the loop has ended on its own.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns refresh loops against a log source.
#[derive(Debug, Clone)]
pub struct PendingRefresher {
    source: Arc<dyn LogSource>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    max_attempts: u32,
}

impl PendingRefresher {
    pub fn new(
        source: Arc<dyn LogSource>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            source,
            clock,
            interval,
            max_attempts,
        }
    }

    /// Start fetching `request` on the refresh interval.
    ///
    /// The first fetch happens immediately. Each fetched frame is sent as a
    /// [`SourceUpdate::Refresh`]. The loop ends when the clock passes
    /// `pending_until`, after `max_attempts` fetches, when the receiver goes
    /// away or when the handle is stopped. [`RefreshHandle::update`] moves
    /// the range and deadline of later fetches. Must be called within a
    /// tokio runtime.
    pub fn spawn(&self, request: PendingRefresh, tx: mpsc::Sender<SourceUpdate>) -> RefreshHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (request_tx, request_rx) = watch::channel(request);
        let source = self.source.clone();
        let clock = self.clock.clone();
        let interval = self.interval;
        let max_attempts = self.max_attempts;

        let task = tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            let mut stop_rx = stop_rx;
            let mut attempts = 0u32;

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let request = request_rx.borrow().clone();
                        if clock.now_ms() > request.pending_until {
                            debug!(pending_until = request.pending_until, "timepoints left the pending window");
                            break;
                        }
                        if attempts >= max_attempts {
                            info!(attempts, query = %request.query, "refresh attempts exhausted");
                            break;
                        }
                        attempts += 1;

                        match source.fetch_log_frames(&request.query, request.range).await {
                            Ok(frame) => {
                                debug!(attempt = attempts, rows = frame.row_count(), "re-fetched pending logs");
                                if tx.send(SourceUpdate::Refresh(frame)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!(attempt = attempts, error = %e, "pending re-fetch failed"),
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        RefreshHandle {
            stop_tx,
            request_tx,
            task,
        }
    }
}

/// Keeps at most one refresh loop alive for the viewer.
#[derive(Debug)]
pub struct RefreshController {
    refresher: PendingRefresher,
    tx: mpsc::Sender<SourceUpdate>,
    current: Option<(PendingRefresh, RefreshHandle)>,
}

impl RefreshController {
    /// Create a controller and the source its loops feed into.
    pub fn new(refresher: PendingRefresher) -> (Self, ChannelSource) {
        let (tx, source) = ChannelSource::create("pending refresh", 16);
        let controller = Self {
            refresher,
            tx,
            current: None,
        };
        (controller, source)
    }

    /// Make the running loop match `request`.
    ///
    /// A request that [continues](PendingRefresh::continues) the current one
    /// keeps its loop and only retargets it, so its interval and attempt
    /// budget hold. A finished loop is not restarted for such a request.
    /// Anything else replaces the loop, and `None` stops it.
    pub fn sync(&mut self, request: Option<PendingRefresh>) {
        if let (Some(wanted), Some((running, handle))) = (&request, self.current.as_mut()) {
            if running.continues(wanted) {
                if running != wanted {
                    handle.update(wanted.clone());
                    *running = wanted.clone();
                }
                return;
            }
        }

        if let Some((_, handle)) = self.current.take() {
            handle.stop();
        }

        if let Some(request) = request {
            debug!(query = %request.query, from = request.range.from, to = request.range.to, "starting pending refresh");
            let handle = self.refresher.spawn(request.clone(), self.tx.clone());
            self.current = Some((request, handle));
        }
    }

    /// The request being refreshed, if its loop is still running.
    pub fn active(&self) -> Option<&PendingRefresh> {
        self.current
            .as_ref()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(request, _)| request)
    }

    pub fn stop(&mut self) {
        self.sync(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawLogFrame;
    use crate::source::{DataSource, ManualClock, SourceError};
    use async_trait::async_trait;
    use checkwatch_types::{CheckConfig, StatelessTimepoint};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LogSource for CountingSource {
        async fn fetch_log_frames(
            &self,
            _query: &LogQuery,
            _range: TimeRange,
        ) -> Result<RawLogFrame, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RawLogFrame::builder()
                .field("labels", [serde_json::json!({})])
                .field("time", [1])
                .field("line", ["x"])
                .build())
        }
    }

    fn request(pending_until: i64) -> PendingRefresh {
        PendingRefresh {
            query: LogQuery::new(),
            range: TimeRange::new(0, 1_000),
            pending_until,
        }
    }

    fn refresher(source: Arc<CountingSource>, now: i64, max_attempts: u32) -> PendingRefresher {
        PendingRefresher::new(
            source,
            Arc::new(ManualClock::new(now)),
            Duration::from_secs(10),
            max_attempts,
        )
    }

    async fn drain(mut rx: mpsc::Receiver<SourceUpdate>) -> usize {
        let mut count = 0;
        while rx.recv().await.is_some() {
            count += 1;
        }
        count
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_bounded() {
        let source = Arc::new(CountingSource::default());
        let (tx, rx) = mpsc::channel(8);
        let _handle = refresher(source.clone(), 500, 3).spawn(request(1_000), tx);

        assert_eq!(drain(rx).await, 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_outside_pending_window() {
        let source = Arc::new(CountingSource::default());
        let (tx, rx) = mpsc::channel(8);
        let _handle = refresher(source.clone(), 1_001, 3).spawn(request(1_000), tx);

        assert_eq!(drain(rx).await, 0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_handle_ends_loop() {
        let source = Arc::new(CountingSource::default());
        let (tx, mut rx) = mpsc::channel(8);
        let handle = refresher(source.clone(), 500, 100).spawn(request(1_000), tx);

        assert!(matches!(rx.recv().await, Some(SourceUpdate::Refresh(_))));
        handle.stop();
        assert!(drain(rx).await <= 1);
        assert!(source.calls.load(Ordering::SeqCst) < 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_controller_feeds_channel_source() {
        let source = Arc::new(CountingSource::default());
        let (mut controller, mut updates) = RefreshController::new(refresher(source.clone(), 500, 1));

        controller.sync(Some(request(1_000)));
        assert_eq!(controller.active(), Some(&request(1_000)));

        let mut received = None;
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if let Some(update) = updates.poll() {
                received = Some(update);
                break;
            }
        }
        assert!(matches!(received, Some(SourceUpdate::Refresh(_))));

        controller.sync(None);
        assert!(controller.active().is_none());
    }

    fn shifted(request: PendingRefresh, by: i64) -> PendingRefresh {
        PendingRefresh {
            range: TimeRange::new(request.range.from + by, request.range.to + by),
            pending_until: request.pending_until + by,
            ..request
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_drifted_request_keeps_running_loop() {
        let source = Arc::new(CountingSource::default());
        let (mut controller, _updates) = RefreshController::new(refresher(source.clone(), 500, 5));

        controller.sync(Some(request(1_000)));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        // Each rebuild sees the same timepoints a little further along
        for step in 1..=4 {
            controller.sync(Some(shifted(request(1_000), step * 250)));
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.active(), Some(&shifted(request(1_000), 1_000)));

        // The interval still drives the next fetch
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disjoint_request_restarts_loop() {
        let source = Arc::new(CountingSource::default());
        let (mut controller, _updates) = RefreshController::new(refresher(source.clone(), 500, 5));

        controller.sync(Some(request(1_000)));
        tokio::time::sleep(Duration::from_millis(1)).await;

        let later = PendingRefresh {
            range: TimeRange::new(1_000, 2_000),
            pending_until: 2_000,
            ..request(1_000)
        };
        controller.sync(Some(later.clone()));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(controller.active(), Some(&later));

        let other = PendingRefresh {
            query: LogQuery::new().with_probes(["Paris"]),
            ..later.clone()
        };
        assert!(!later.continues(&other));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_loop_is_not_restarted_by_drift() {
        let source = Arc::new(CountingSource::default());
        let (mut controller, _updates) = RefreshController::new(refresher(source.clone(), 500, 1));

        controller.sync(Some(request(100_000)));
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(controller.active().is_none());

        controller.sync(Some(shifted(request(100_000), 500)));
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pending_refresh_from_timepoints() {
        let timepoint = |adjusted_time: i64, status: TimepointStatus| StatefulTimepoint {
            timepoint: StatelessTimepoint {
                adjusted_time,
                config: CheckConfig::new(1_000, 0),
                timepoint_duration: 1_000,
                index: 0,
            },
            probe_results: BTreeMap::new(),
            status,
            max_probe_duration: 0,
        };
        let timepoints = [
            timepoint(1_000, TimepointStatus::Success),
            timepoint(2_000, TimepointStatus::Pending),
            timepoint(3_000, TimepointStatus::Pending),
            timepoint(4_000, TimepointStatus::Pending),
        ];
        let base = LogQuery::new().selector("job", "api");

        let refresh =
            PendingRefresh::from_timepoints(&timepoints, 3_500, &base, ["Paris", "Tokyo"]).unwrap();
        assert_eq!(refresh.range, TimeRange::new(2_000, 4_000));
        assert_eq!(refresh.pending_until, 4_000);
        assert_eq!(refresh.query.probes, vec!["Paris", "Tokyo"]);
        assert_eq!(refresh.query.selectors.get("job").map(String::as_str), Some("api"));

        assert!(PendingRefresh::from_timepoints(&timepoints[..1], 3_500, &base, ["Paris"]).is_none());
        assert!(PendingRefresh::from_timepoints(&timepoints, 1_500, &base, ["Paris"]).is_none());
    }
}
