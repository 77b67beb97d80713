//! # checkwatch
//!
//! Reconstructs the execution timeline of a synthetic monitoring check and
//! browses it in a terminal UI.
//!
//! A check runs on a schedule from several probes. Each run leaves a trail
//! of log records. This crate turns raw log frames and the check's config
//! history into an idealized grid of timepoints, attributes each probe's
//! runs to them, derives a status per timepoint, and places lifecycle
//! annotations over whatever slice of the grid is on screen.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │(timeline)│    │(render) │    │         │ │
//! │  └────┬────┘    └──────────┘    └─────────┘    └─────────┘ │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  ┌─────────┐                                                │
//! │  │ source  │◀── FileSource | ChannelSource | refresh loop   │
//! │  │ (input) │                                                │
//! │  └─────────┘                                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, window navigation, and export
//! - **[`source`]**: Input abstraction ([`DataSource`] trait) with file and
//!   channel implementations, plus the pending timepoint re-fetch loop
//! - **[`data`]**: The timeline engine: frame normalization, execution
//!   grouping, the schedule grid, status projection, minimap paging, and
//!   annotations
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]** and **[`logging`]**: Layered settings and tracing setup
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Browse a check's last three hours
//! checkwatch --frames frames.json --configs configs.json
//!
//! # Export the timeline as of a fixed instant
//! checkwatch --frames frames.json --configs configs.json --now 1700000000000 --export out.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use checkwatch::{Timeline, TimelineOptions};
//! use checkwatch_types::{CheckConfig, TimeRange};
//!
//! let configs = vec![CheckConfig::new(60_000, 0)];
//! let range = TimeRange::new(0, 10 * 60_000);
//! let timeline = Timeline::build(&[], &configs, range, range.to, &TimelineOptions::default()).unwrap();
//! assert_eq!(timeline.timepoints().len(), 11);
//! ```
//!
//! ### Feeding the app from a channel
//!
//! ```
//! use std::sync::Arc;
//! use checkwatch::{App, ChannelSource, Settings, SystemClock};
//!
//! let (tx, source) = ChannelSource::create("probe feed", 16);
//! let app = App::new(vec![Box::new(source)], Arc::new(SystemClock), &Settings::default()).unwrap();
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod logging;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use data::{
    ExecutionMarkers, TimelineError, Timeline, TimelineOptions, WindowReconciler,
};
pub use source::{
    ChannelSource, Clock, ConfigHistorySource, DataSource, FileSource, FileStore, LogQuery,
    LogSource, ManualClock, SourceError, SourceUpdate, SystemClock,
};
