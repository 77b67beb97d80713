//! Layered settings: defaults, an optional TOML file, then `CHECKWATCH__*`
//! environment variables.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::data::duration::{parse_duration, parse_duration_ms};
use crate::data::{ExecutionMarkers, TimelineOptions};
use crate::source::LogQuery;

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub markers: ExecutionMarkers,
    pub timeline: TimelineSettings,
    pub refresh: RefreshSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    /// How far back from now the timeline reaches, e.g. "3h".
    pub range: String,
    /// Log retention, e.g. "31d".
    pub retention: String,
    pub sections_per_page: usize,
    /// Terminal columns per timepoint.
    pub cell_width: u16,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            range: "3h".to_string(),
            retention: "31d".to_string(),
            sections_per_page: 6,
            cell_width: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    pub enabled: bool,
    pub interval: String,
    pub max_attempts: u32,
    /// Label selectors every log fetch is narrowed by.
    pub selectors: BTreeMap<String, String>,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: "10s".to_string(),
            max_attempts: 30,
            selectors: BTreeMap::new(),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
    /// Per-module levels, e.g. `source = "debug"`.
    pub component_levels: BTreeMap<String, String>,
    /// Where interactive-mode logs go. Without one they are discarded.
    pub file: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
            component_levels: BTreeMap::new(),
            file: None,
        }
    }
}

impl Settings {
    /// Load settings, layering the optional file and the environment over
    /// the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix("CHECKWATCH").separator("__"))
            .build()
            .context("failed to read settings")?;

        let settings: Settings = config.try_deserialize().context("invalid settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings whose durations do not parse.
    pub fn validate(&self) -> Result<()> {
        self.range_ms()?;
        self.retention_ms()?;
        self.refresh_interval()?;
        Ok(())
    }

    pub fn range_ms(&self) -> Result<i64> {
        parse_duration_ms(&self.timeline.range)
            .with_context(|| format!("timeline.range `{}`", self.timeline.range))
    }

    pub fn retention_ms(&self) -> Result<i64> {
        parse_duration_ms(&self.timeline.retention)
            .with_context(|| format!("timeline.retention `{}`", self.timeline.retention))
    }

    pub fn refresh_interval(&self) -> Result<Duration> {
        parse_duration(&self.refresh.interval)
            .with_context(|| format!("refresh.interval `{}`", self.refresh.interval))
    }

    pub fn timeline_options(&self) -> Result<TimelineOptions> {
        Ok(TimelineOptions {
            markers: self.markers.clone(),
            retention_ms: self.retention_ms()?,
            ..TimelineOptions::default()
        })
    }

    /// The base query for log fetches.
    pub fn log_query(&self) -> LogQuery {
        self.refresh
            .selectors
            .iter()
            .fold(LogQuery::new(), |query, (k, v)| query.selector(k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.range_ms().unwrap(), 3 * 60 * 60 * 1000);
        assert_eq!(settings.retention_ms().unwrap(), 31 * 24 * 60 * 60 * 1000);
        assert_eq!(settings.refresh_interval().unwrap(), Duration::from_secs(10));
        assert_eq!(settings.timeline.sections_per_page, 6);
        assert_eq!(settings.markers.start, vec!["Beginning check".to_string()]);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[markers]
start = ["starting probe"]

[timeline]
range = "30m"
cell_width = 3

[refresh]
enabled = false
selectors = {{ job = "api" }}

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.markers.start, vec!["starting probe".to_string()]);
        assert_eq!(settings.markers.success, ExecutionMarkers::default().success);
        assert_eq!(settings.range_ms().unwrap(), 30 * 60 * 1000);
        assert_eq!(settings.timeline.cell_width, 3);
        assert_eq!(settings.timeline.sections_per_page, 6);
        assert!(!settings.refresh.enabled);
        assert_eq!(settings.log_query(), LogQuery::new().selector("job", "api"));
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[timeline]\nrange = \"forever\"").unwrap();

        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(format!("{:#}", err).contains("timeline.range"));
    }
}
