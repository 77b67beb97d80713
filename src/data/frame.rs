//! Columnar log frames and schema normalization.
//!
//! Log backends return frames in one of two shapes: the classic one with
//! `time`/`line`/`tsNs` columns and the newer one with `timestamp`/`body`.
//! [`normalize_frame`] resolves the shape once and hands back canonical
//! columns so nothing downstream needs to know which one it was.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::TimelineError;

/// A raw column-oriented log frame as returned by a log backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawLogFrame {
    #[serde(default)]
    pub fields: Vec<FrameField>,
}

/// One named column of a [`RawLogFrame`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameField {
    pub name: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl RawLogFrame {
    /// Create a builder for constructing frames.
    pub fn builder() -> RawLogFrameBuilder {
        RawLogFrameBuilder::default()
    }

    /// Look up a column by name.
    pub fn field(&self, name: &str) -> Option<&FrameField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Row count of the first column, 0 for a frame without columns.
    pub fn row_count(&self) -> usize {
        self.fields.first().map_or(0, |f| f.values.len())
    }
}

/// Builder for [`RawLogFrame`].
#[derive(Debug, Default)]
pub struct RawLogFrameBuilder {
    fields: Vec<FrameField>,
}

impl RawLogFrameBuilder {
    /// Append a column.
    pub fn field<I>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.fields.push(FrameField {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn build(self) -> RawLogFrame {
        RawLogFrame {
            fields: self.fields,
        }
    }
}

/// Which column layout a frame uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSchema {
    /// `time` / `line` / optional `tsNs`.
    Classic,
    /// `timestamp` / `body`.
    Modern,
}

impl FrameSchema {
    fn time_column(self) -> &'static str {
        match self {
            FrameSchema::Classic => "time",
            FrameSchema::Modern => "timestamp",
        }
    }

    fn line_column(self) -> &'static str {
        match self {
            FrameSchema::Classic => "line",
            FrameSchema::Modern => "body",
        }
    }

    /// Detect the layout from column names.
    pub fn detect(frame: &RawLogFrame) -> Option<Self> {
        [FrameSchema::Modern, FrameSchema::Classic]
            .into_iter()
            .find(|schema| {
                frame.field(schema.time_column()).is_some()
                    && frame.field(schema.line_column()).is_some()
            })
    }
}

/// Canonical column names after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Labels,
    Time,
    Line,
    TsNs,
    LabelTypes,
    Id,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Labels,
        Column::Time,
        Column::Line,
        Column::TsNs,
        Column::LabelTypes,
        Column::Id,
    ];

    /// Canonical (classic) column name.
    pub fn name(&self) -> &'static str {
        match self {
            Column::Labels => "labels",
            Column::Time => "time",
            Column::Line => "line",
            Column::TsNs => "tsNs",
            Column::LabelTypes => "labelTypes",
            Column::Id => "id",
        }
    }
}

/// A frame rewritten into the canonical column set.
///
/// Every canonical column is present; columns the source frame lacked are
/// filled with `null` placeholders so later stages can derive them.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFrame {
    schema: FrameSchema,
    rows: usize,
    columns: Vec<(Column, Vec<Value>)>,
}

impl NormalizedFrame {
    /// The layout the source frame used.
    pub fn schema(&self) -> FrameSchema {
        self.schema
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Values of a canonical column.
    pub fn column(&self, column: Column) -> &[Value] {
        self.columns
            .iter()
            .find(|(c, _)| *c == column)
            .map_or(&[], |(_, values)| values.as_slice())
    }

    /// Iterate over the canonical columns.
    pub fn columns(&self) -> impl Iterator<Item = (Column, &[Value])> {
        self.columns.iter().map(|(c, v)| (*c, v.as_slice()))
    }
}

/// Normalize a raw frame into the canonical column set.
pub fn normalize_frame(frame: &RawLogFrame) -> Result<NormalizedFrame, TimelineError> {
    if frame.fields.is_empty() {
        return Err(TimelineError::malformed("frame has no columns"));
    }

    let rows = frame.row_count();
    if let Some(field) = frame.fields.iter().find(|f| f.values.len() != rows) {
        return Err(TimelineError::malformed(format!(
            "column `{}` has {} rows, expected {}",
            field.name,
            field.values.len(),
            rows
        )));
    }

    let schema = FrameSchema::detect(frame).ok_or_else(|| {
        TimelineError::malformed("no `time`/`line` or `timestamp`/`body` columns")
    })?;

    let required = |name: &str| -> Result<Vec<Value>, TimelineError> {
        frame
            .field(name)
            .map(|f| f.values.clone())
            .ok_or_else(|| TimelineError::malformed(format!("missing `{}` column", name)))
    };
    let optional = |name: &str| -> Vec<Value> {
        frame.field(name).map_or_else(|| vec![Value::Null; rows], |f| f.values.clone())
    };

    let columns = vec![
        (Column::Labels, required(Column::Labels.name())?),
        (Column::Time, required(schema.time_column())?),
        (Column::Line, required(schema.line_column())?),
        (Column::TsNs, optional(Column::TsNs.name())),
        (Column::LabelTypes, optional(Column::LabelTypes.name())),
        (Column::Id, optional(Column::Id.name())),
    ];

    Ok(NormalizedFrame {
        schema,
        rows,
        columns,
    })
}
