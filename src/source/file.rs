//! File-based data source.
//!
//! Polls a JSON file of log frames and, optionally, a JSON file of config
//! history. Each file is re-read only when its modification time moves.

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use checkwatch_types::CheckConfig;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{DataSource, SourceError, SourceUpdate};
use crate::data::RawLogFrame;

#[derive(Deserialize)]
#[serde(untagged)]
enum FramesDocument {
    Many(Vec<RawLogFrame>),
    One(RawLogFrame),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigsDocument {
    History(Vec<CheckConfig>),
    ByCheck(BTreeMap<String, Vec<CheckConfig>>),
}

/// Decode a frames document: a single frame or an array of frames.
pub fn parse_frames(content: &str, origin: &str) -> Result<Vec<RawLogFrame>, SourceError> {
    match serde_json::from_str(content) {
        Ok(FramesDocument::Many(frames)) => Ok(frames),
        Ok(FramesDocument::One(frame)) => Ok(vec![frame]),
        Err(e) => Err(SourceError::Parse {
            origin: origin.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Decode a config history document.
///
/// Either a plain array of configs, or an object of arrays keyed by check
/// id. The keyed form needs `check` unless it holds exactly one check.
pub fn parse_configs(
    content: &str,
    origin: &str,
    check: Option<&str>,
) -> Result<Vec<CheckConfig>, SourceError> {
    let parse_error = |reason: String| SourceError::Parse {
        origin: origin.to_string(),
        reason,
    };

    let document: ConfigsDocument =
        serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?;

    match document {
        ConfigsDocument::History(configs) => Ok(configs),
        ConfigsDocument::ByCheck(mut checks) => match check {
            Some(id) => checks
                .remove(id)
                .ok_or_else(|| parse_error(format!("no config history for check `{}`", id))),
            None if checks.len() == 1 => Ok(checks.into_values().next().unwrap_or_default()),
            None => Err(parse_error(format!(
                "{} checks present, select one with --check",
                checks.len()
            ))),
        },
    }
}

#[derive(Debug)]
struct WatchedFile {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl WatchedFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            last_modified: None,
        }
    }

    fn modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    /// Read the file if it changed since the last successful read.
    fn read_if_changed(&mut self) -> Result<Option<(String, Option<SystemTime>)>, SourceError> {
        let current = self.modified_time();
        let changed = match (&self.last_modified, &current) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(last), Some(current)) => current > last,
        };
        if !changed {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some((content, current)))
    }
}

/// A data source that reads frames and config history from JSON files.
#[derive(Debug)]
pub struct FileSource {
    frames: WatchedFile,
    configs: Option<WatchedFile>,
    check: Option<String>,
    description: String,
    last_error: Option<String>,
    queued: VecDeque<SourceUpdate>,
}

impl FileSource {
    /// Create a source for a frames file and an optional configs file.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        frames: P,
        configs: Option<Q>,
        check: Option<&str>,
    ) -> Self {
        let frames = frames.as_ref().to_path_buf();
        let description = format!("file: {}", frames.display());
        Self {
            frames: WatchedFile::new(frames),
            configs: configs.map(|p| WatchedFile::new(p.as_ref().to_path_buf())),
            check: check.map(str::to_string),
            description,
            last_error: None,
            queued: VecDeque::new(),
        }
    }

    /// Returns the frames path being monitored.
    pub fn path(&self) -> &Path {
        &self.frames.path
    }

    fn check_frames(&mut self) -> Result<(), SourceError> {
        let Some((content, modified)) = self.frames.read_if_changed()? else {
            return Ok(());
        };
        let origin = self.frames.path.display().to_string();
        let frames = parse_frames(&content, &origin)?;
        debug!(path = %origin, frames = frames.len(), "loaded log frames");
        self.frames.last_modified = modified;
        self.queued.push_back(SourceUpdate::Logs(frames));
        Ok(())
    }

    fn check_configs(&mut self) -> Result<(), SourceError> {
        let Some(watched) = self.configs.as_mut() else {
            return Ok(());
        };
        let Some((content, modified)) = watched.read_if_changed()? else {
            return Ok(());
        };
        let origin = watched.path.display().to_string();
        let configs = parse_configs(&content, &origin, self.check.as_deref())?;
        debug!(path = %origin, configs = configs.len(), "loaded config history");
        watched.last_modified = modified;
        self.queued.push_back(SourceUpdate::Configs(configs));
        Ok(())
    }
}

impl DataSource for FileSource {
    fn poll(&mut self) -> Option<SourceUpdate> {
        if self.queued.is_empty() {
            let result = self.check_configs().and_then(|()| self.check_frames());
            match result {
                Ok(()) => self.last_error = None,
                Err(e) => {
                    warn!(error = %e, "file source poll failed");
                    self.last_error = Some(e.to_string());
                }
            }
        }
        self.queued.pop_front()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
