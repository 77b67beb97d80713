//! # checkwatch-types
//!
//! Core value types for reconstructing check execution timelines. A check is
//! run periodically by a set of probes; every run leaves a trail of log
//! records. These types describe the records, the schedule a check is
//! expected to follow, and the derived timeline.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature for JSON import/export
//! - **Immutable values**: Everything here is recomputed from inputs, never patched in place
//! - **Ergonomic builders**: Fluent API for constructing records in tests and tools
//!
//! ## Example
//!
//! ```rust
//! use checkwatch_types::{CheckConfig, ParsedLogRecord};
//!
//! let record = ParsedLogRecord::builder()
//!     .time(1_700_000_000_000)
//!     .label("probe", "Paris")
//!     .label("msg", "Beginning check")
//!     .build();
//!
//! assert_eq!(record.labels.probe(), Some("Paris"));
//! assert_eq!(record.ts_ns, 1_700_000_000_000 * 1_000_000);
//!
//! let config = CheckConfig::new(60_000, 1_700_000_000_000);
//! assert!(config.is_valid());
//! ```

mod config;
mod event;
mod range;
mod record;
mod timepoint;

pub use config::*;
pub use event::*;
pub use range::*;
pub use record::*;
pub use timepoint::*;
