//! Timeline reconstruction for check executions.
//!
//! Everything here is a pure function over explicit inputs. The viewer and
//! the sources feed frames, config history and the current time in; this
//! module turns them into a projected, paginated timeline.
//!
//! ## Submodules
//!
//! - [`frame`]: Raw columnar frames and schema normalization
//! - [`records`]: Flattening frames into sorted [`ParsedLogRecord`](checkwatch_types::ParsedLogRecord)s
//! - [`grouping`]: Per-probe execution grouping
//! - [`timepoints`]: The idealized schedule grid
//! - [`projection`]: Merging executions onto the grid
//! - [`minimap`] and [`window`]: Pages, sections and the visible window
//! - [`annotations`]: Lifecycle events placed on the visible window
//! - [`timeline`]: The composed pipeline
//! - [`duration`]: Human-readable duration strings
//!
//! ## Data Flow
//!
//! ```text
//! RawLogFrame[]                    CheckConfig[]
//!      │                                │
//!      ▼                                ▼
//! normalize_frame()              build_timepoints()
//!      │                                │
//!      ▼                                │
//! flatten_frames()                      │
//!      │                                │
//!      ▼                                │
//! group_executions() ──────┬────────────┤
//!                          ▼            ▼
//!                  project_timepoints(visible)  ◀── WindowReconciler
//!                                       │
//!                                       ▼
//!                  get_closest_timepoints_to_check_event()
//! ```

pub mod annotations;
pub mod duration;
pub mod error;
pub mod frame;
pub mod grouping;
pub mod minimap;
pub mod projection;
pub mod records;
pub mod timeline;
pub mod timepoints;
pub mod window;

pub use annotations::{build_check_events, get_check_events_in_range, get_closest_timepoints_to_check_event};
pub use error::TimelineError;
pub use frame::{normalize_frame, Column, FrameSchema, NormalizedFrame, RawLogFrame};
pub use grouping::{
    discard_incomplete_checks, group_by_execution, group_by_probe, group_executions, Execution,
    ExecutionMarkers, LogRole,
};
pub use minimap::{find_nearest, get_mini_map_pages, get_mini_map_sections};
pub use projection::{
    is_in_the_future, is_pending, max_probe_duration, project_timepoints, MAX_PROBE_DURATION_DEFAULT,
};
pub use records::{dedupe_records, flatten_frame, flatten_frames, records_to_frame, ColumnTransforms};
pub use timeline::{Timeline, TimelineOptions};
pub use timepoints::build_timepoints;
pub use window::{display_count_for_width, WindowReconciler};
