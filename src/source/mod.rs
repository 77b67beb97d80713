//! Where log frames, config history and the current time come from.
//!
//! Two styles of source live here. The async [`LogSource`] and
//! [`ConfigHistorySource`] traits answer explicit queries and back the
//! pending re-fetch loop. The polling [`DataSource`] trait feeds the viewer
//! loop without blocking: file watching, in-memory channels and the refresher
//! all surface as [`SourceUpdate`]s.

mod channel;
mod clock;
mod file;
mod refresh;
mod store;

pub use channel::ChannelSource;
pub use clock::{Clock, ManualClock, SystemClock};
pub use file::{parse_configs, parse_frames, FileSource};
pub use refresh::{PendingRefresh, PendingRefresher, RefreshController, RefreshHandle};
pub use store::FileStore;

use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::path::PathBuf;

use async_trait::async_trait;
use checkwatch_types::{CheckConfig, Labels, TimeRange};
use thiserror::Error;

use crate::data::RawLogFrame;

/// Errors from fetching or decoding source data.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Reading the underlying file failed.
    #[error("Read error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The data could not be decoded.
    #[error("Parse error in {origin}: {reason}")]
    Parse { origin: String, reason: String },

    /// The source cannot answer right now.
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Label selectors for a log fetch.
///
/// A record matches when every selector label has the given value and, if
/// `probes` is non-empty, its probe is one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub selectors: BTreeMap<String, String>,
    pub probes: Vec<String>,
}

impl LogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selector(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.selectors.insert(key.into(), value.into());
        self
    }

    /// Narrow the query to the given probes.
    pub fn with_probes<I, S>(mut self, probes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.probes = probes.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches(&self, labels: &Labels) -> bool {
        let selectors_match = self
            .selectors
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value.as_str()));
        let probe_matches = self.probes.is_empty()
            || labels.probe().is_some_and(|p| self.probes.iter().any(|q| q == p));
        selectors_match && probe_matches
    }
}

impl fmt::Display for LogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> =
            self.selectors.iter().map(|(k, v)| format!("{}=\"{}\"", k, v)).collect();
        if !self.probes.is_empty() {
            parts.push(format!("probe=~\"{}\"", self.probes.join("|")));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Fetches log frames for a query and time range.
#[async_trait]
pub trait LogSource: Send + Sync + Debug {
    async fn fetch_log_frames(
        &self,
        query: &LogQuery,
        range: TimeRange,
    ) -> Result<RawLogFrame, SourceError>;
}

/// Fetches a check's schedule history.
#[async_trait]
pub trait ConfigHistorySource: Send + Sync + Debug {
    /// Configs relevant to `range`: every change up to `range.to`, so the one
    /// in effect at `range.from` is included.
    async fn fetch_check_config_history(
        &self,
        check_id: &str,
        range: TimeRange,
    ) -> Result<Vec<CheckConfig>, SourceError>;
}

/// New data for the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceUpdate {
    /// A full replacement of the log frames.
    Logs(Vec<RawLogFrame>),
    /// An additional frame from a re-fetch, merged with what is loaded.
    Refresh(RawLogFrame),
    /// A full replacement of the config history.
    Configs(Vec<CheckConfig>),
}

/// Trait for receiving timeline inputs without blocking.
///
/// # Example
///
/// ```no_run
/// use checkwatch::source::{DataSource, FileSource};
///
/// let mut source = FileSource::new("frames.json", Some("configs.json"), None);
/// while let Some(update) = source.poll() {
///     println!("{:?}", update);
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Next pending update, `None` when there is nothing new.
    fn poll(&mut self) -> Option<SourceUpdate>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI header.
    fn description(&self) -> &str;

    /// The error from the last poll, if any.
    fn error(&self) -> Option<&str>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_query_matches() {
        let query = LogQuery::new().selector("job", "api").with_probes(["Paris", "Tokyo"]);

        assert!(query.matches(&labels(&[("job", "api"), ("probe", "Paris")])));
        assert!(!query.matches(&labels(&[("job", "api"), ("probe", "Oslo")])));
        assert!(!query.matches(&labels(&[("job", "web"), ("probe", "Paris")])));
        assert!(!query.matches(&labels(&[("job", "api")])));
        assert!(LogQuery::new().matches(&labels(&[])));
    }

    #[test]
    fn test_query_display() {
        let query = LogQuery::new().selector("job", "api").with_probes(["Paris", "Tokyo"]);
        assert_eq!(query.to_string(), "{job=\"api\", probe=~\"Paris|Tokyo\"}");
        assert_eq!(LogQuery::new().to_string(), "{}");
    }
}
