//! Query-style access to frames and config history stored as JSON files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use checkwatch_types::{CheckConfig, TimeRange};
use tracing::debug;

use super::file::{parse_configs, parse_frames};
use super::{ConfigHistorySource, LogQuery, LogSource, SourceError};
use crate::data::records::{flatten_frames, records_to_frame, ColumnTransforms};
use crate::data::RawLogFrame;

/// Answers [`LogSource`] and [`ConfigHistorySource`] queries from files.
///
/// Files are re-read on every fetch so that a re-fetch sees lines appended
/// since the previous one.
///
/// # Example
///
/// ```
/// use std::io::Write;
/// use checkwatch::source::{FileStore, LogQuery, LogSource};
/// use checkwatch_types::TimeRange;
///
/// let mut file = tempfile::NamedTempFile::new().unwrap();
/// write!(file, r#"{{"fields": [
///     {{"name": "labels", "values": [{{"probe": "Paris"}}, {{"probe": "Tokyo"}}]}},
///     {{"name": "time", "values": [1000, 5000]}},
///     {{"name": "line", "values": ["a", "b"]}}
/// ]}}"#).unwrap();
///
/// # tokio_test::block_on(async {
/// let store = FileStore::new(file.path(), None);
/// let query = LogQuery::new().with_probes(["Paris"]);
/// let frame = store.fetch_log_frames(&query, TimeRange::new(0, 10_000)).await.unwrap();
/// assert_eq!(frame.row_count(), 1);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    frames: PathBuf,
    configs: Option<PathBuf>,
}

impl FileStore {
    pub fn new(frames: impl Into<PathBuf>, configs: Option<PathBuf>) -> Self {
        Self {
            frames: frames.into(),
            configs,
        }
    }

    async fn read(path: &Path) -> Result<String, SourceError> {
        tokio::fs::read_to_string(path).await.map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[async_trait]
impl LogSource for FileStore {
    async fn fetch_log_frames(
        &self,
        query: &LogQuery,
        range: TimeRange,
    ) -> Result<RawLogFrame, SourceError> {
        let origin = self.frames.display().to_string();
        let content = Self::read(&self.frames).await?;
        let frames = parse_frames(&content, &origin)?;

        let records = flatten_frames(&frames, &ColumnTransforms::standard()).map_err(|e| {
            SourceError::Parse {
                origin: origin.clone(),
                reason: e.to_string(),
            }
        })?;
        let matching: Vec<_> = records
            .into_iter()
            .filter(|r| range.contains(r.time) && query.matches(&r.labels))
            .collect();

        debug!(%query, from = range.from, to = range.to, rows = matching.len(), "fetched log frames");
        Ok(records_to_frame(&matching))
    }
}

#[async_trait]
impl ConfigHistorySource for FileStore {
    async fn fetch_check_config_history(
        &self,
        check_id: &str,
        range: TimeRange,
    ) -> Result<Vec<CheckConfig>, SourceError> {
        let Some(path) = &self.configs else {
            return Err(SourceError::Unavailable("no config history file".to_string()));
        };
        let content = Self::read(path).await?;
        let check = (!check_id.is_empty()).then_some(check_id);
        let mut configs = parse_configs(&content, &path.display().to_string(), check)?;
        configs.retain(|c| c.date <= range.to);
        configs.sort_by_key(|c| c.date);
        Ok(configs)
    }
}
