//! Tracing subscriber setup.
//!
//! The interactive viewer owns the terminal, so its logs go to a file or
//! nowhere. Export mode logs to stderr.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingSettings};

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// The interactive viewer is running.
    Terminal,
    /// A non-interactive command is running.
    Stderr,
}

/// Build the filter string from the base level and per-module levels.
///
/// ```
/// use checkwatch::config::LoggingSettings;
/// use checkwatch::logging::build_filter_directives;
///
/// let mut settings = LoggingSettings::default();
/// settings.component_levels.insert("source".to_string(), "debug".to_string());
/// assert_eq!(build_filter_directives(&settings), "info,checkwatch::source=debug");
/// ```
pub fn build_filter_directives(settings: &LoggingSettings) -> String {
    let mut filter_str = settings.level.clone();
    for (component, level) in &settings.component_levels {
        filter_str.push_str(&format!(",checkwatch::{}={}", component, level));
    }
    filter_str
}

/// Install the global subscriber. `RUST_LOG` overrides the settings.
pub fn init(settings: &LoggingSettings, target: LogTarget) -> Result<()> {
    let filter_str = build_filter_directives(settings);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match (target, settings.file.as_deref()) {
        (LogTarget::Terminal, None) => Ok(()),
        (LogTarget::Terminal, Some(path)) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path))?;
            install(env_filter, settings.format, Mutex::new(file), false)
        }
        (LogTarget::Stderr, _) => install(env_filter, settings.format, std::io::stderr, true),
    }
}

fn install<W>(filter: EnvFilter, format: LogFormat, writer: W, ansi: bool) -> Result<()>
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi);

    let result = match format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}
