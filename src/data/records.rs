//! Flattening normalized frames into sorted log records.
//!
//! This is the only place records are ordered. Everything downstream relies
//! on the output being sorted by `ts_ns` and never re-sorts.

use std::collections::{BTreeMap, HashSet};

use checkwatch_types::{Labels, ParsedLogRecord};
use serde_json::{Map, Value};

use super::error::TimelineError;
use super::frame::{normalize_frame, Column, NormalizedFrame, RawLogFrame};

static NULL: Value = Value::Null;

/// A per-cell value rewrite applied before a row is assembled.
pub type ValueTransform = fn(Value) -> Value;

/// Per-column value transforms.
#[derive(Debug, Clone, Default)]
pub struct ColumnTransforms {
    transforms: BTreeMap<Column, ValueTransform>,
}

impl ColumnTransforms {
    /// No transforms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Numeric coercion for the timestamp columns, which some backends send
    /// as strings.
    pub fn standard() -> Self {
        Self::new().with(Column::TsNs, coerce_number).with(Column::Time, coerce_number)
    }

    /// Register a transform for a column, replacing any previous one.
    pub fn with(mut self, column: Column, transform: ValueTransform) -> Self {
        self.transforms.insert(column, transform);
        self
    }

    fn apply(&self, column: Column, value: Value) -> Value {
        match self.transforms.get(&column) {
            Some(transform) => transform(value),
            None => value,
        }
    }
}

/// Turn numeric strings into JSON numbers. Anything else passes through.
pub fn coerce_number(value: Value) -> Value {
    match &value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                Value::from(n)
            } else if let Ok(f) = s.parse::<f64>() {
                Value::from(f)
            } else {
                value
            }
        }
        _ => value,
    }
}

/// Flatten one normalized frame into records sorted by `ts_ns`.
pub fn flatten_frame(
    frame: &NormalizedFrame,
    transforms: &ColumnTransforms,
) -> Result<Vec<ParsedLogRecord>, TimelineError> {
    let mut records = (0..frame.row_count())
        .map(|row| {
            let mut merged = Map::new();
            for (column, values) in frame.columns() {
                let value = values.get(row).cloned().unwrap_or(Value::Null);
                merged.insert(column.name().to_string(), transforms.apply(column, value));
            }
            record_from_row(row, &merged)
        })
        .collect::<Result<Vec<_>, _>>()?;

    records.sort_by_key(|r| r.ts_ns);
    Ok(records)
}

/// Normalize and flatten several frames into one sorted record stream.
///
/// Frames are concatenated in the order given before the stable sort, so
/// records with equal `ts_ns` keep frame order, then row order.
pub fn flatten_frames(
    frames: &[RawLogFrame],
    transforms: &ColumnTransforms,
) -> Result<Vec<ParsedLogRecord>, TimelineError> {
    let mut records = Vec::new();
    for frame in frames {
        let normalized = normalize_frame(frame)?;
        records.extend(flatten_frame(&normalized, transforms)?);
    }
    records.sort_by_key(|r| r.ts_ns);
    Ok(records)
}

/// Drop repeated records, keeping the first occurrence.
///
/// Records are identified by `id`, or by `ts_ns` and `line` when the
/// backend did not supply an id. Order is preserved.
pub fn dedupe_records(records: Vec<ParsedLogRecord>) -> Vec<ParsedLogRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let key = if r.id.is_empty() {
                format!("{}\u{0}{}", r.ts_ns, r.line)
            } else {
                r.id.clone()
            };
            seen.insert(key)
        })
        .collect()
}

/// Encode records as a classic-schema frame, the inverse of flattening.
pub fn records_to_frame(records: &[ParsedLogRecord]) -> RawLogFrame {
    RawLogFrame::builder()
        .field(Column::Labels.name(), records.iter().map(|r| string_object(r.labels.iter())))
        .field(Column::Time.name(), records.iter().map(|r| r.time))
        .field(Column::Line.name(), records.iter().map(|r| r.line.as_str()))
        .field(Column::TsNs.name(), records.iter().map(|r| r.ts_ns.to_string()))
        .field(Column::LabelTypes.name(), records.iter().map(|r| string_object(r.label_types.iter())))
        .field(Column::Id.name(), records.iter().map(|r| r.id.as_str()))
        .build()
}

fn string_object<'a>(entries: impl Iterator<Item = (&'a String, &'a String)>) -> Value {
    Value::Object(entries.map(|(k, v)| (k.clone(), Value::from(v.as_str()))).collect())
}

fn record_from_row(row: usize, merged: &Map<String, Value>) -> Result<ParsedLogRecord, TimelineError> {
    let cell = |column: Column| merged.get(column.name()).unwrap_or(&NULL);

    let time = as_i64(cell(Column::Time)).ok_or_else(|| {
        TimelineError::malformed(format!("row {}: `time` is not a timestamp", row))
    })?;

    let ts_ns = match cell(Column::TsNs) {
        Value::Null => time.saturating_mul(1_000_000),
        value => as_i64(value).ok_or_else(|| {
            TimelineError::malformed(format!("row {}: `tsNs` is not a timestamp", row))
        })?,
    };

    Ok(ParsedLogRecord {
        labels: Labels::from(as_string_map(cell(Column::Labels))),
        time,
        ts_ns,
        line: as_text(cell(Column::Line)),
        id: as_text(cell(Column::Id)),
        label_types: as_string_map(cell(Column::LabelTypes)),
    })
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Labels arrive either as a JSON object or as a JSON-encoded string of one.
fn as_string_map(value: &Value) -> BTreeMap<String, String> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), as_text(v))).collect(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), as_text(v))).collect(),
            _ => BTreeMap::new(),
        },
        _ => BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(times: &[i64], ts_ns: Option<&[&str]>) -> RawLogFrame {
        let mut builder = RawLogFrame::builder()
            .field("labels", times.iter().map(|t| json!({"probe": "Paris", "seq": t.to_string()})))
            .field("time", times.iter().copied())
            .field("line", times.iter().map(|t| format!("line {}", t)));
        if let Some(ts) = ts_ns {
            builder = builder.field("tsNs", ts.iter().copied());
        }
        builder.build()
    }

    #[test]
    fn test_records_are_sorted_by_ts_ns() {
        let raw = frame(&[3_000, 1_000, 2_000], None);
        let records = flatten_frames(&[raw], &ColumnTransforms::standard()).unwrap();

        let ts: Vec<i64> = records.iter().map(|r| r.ts_ns).collect();
        assert_eq!(ts, vec![1_000_000_000, 2_000_000_000, 3_000_000_000]);
        assert!(records.windows(2).all(|w| w[0].ts_ns <= w[1].ts_ns));
    }

    #[test]
    fn test_string_ts_ns_is_coerced_and_authoritative() {
        // Same millisecond, different nanoseconds, reverse row order.
        let raw = frame(&[1_000, 1_000], Some(&["1000000900", "1000000100"][..]));
        let records = flatten_frames(&[raw], &ColumnTransforms::standard()).unwrap();

        assert_eq!(records[0].ts_ns, 1_000_000_100);
        assert_eq!(records[0].line, "line 1000");
        assert_eq!(records[1].ts_ns, 1_000_000_900);
    }

    #[test]
    fn test_ties_keep_row_order() {
        let raw = RawLogFrame::builder()
            .field("labels", [json!({}), json!({}), json!({})])
            .field("time", [5, 5, 5])
            .field("line", ["first", "second", "third"])
            .build();
        let records = flatten_frames(&[raw], &ColumnTransforms::new()).unwrap();
        let lines: Vec<&str> = records.iter().map(|r| r.line.as_str()).collect();
        assert_eq!(lines, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_label_cells_parsed_from_object_or_string() {
        let raw = RawLogFrame::builder()
            .field("labels", [json!({"probe": "Paris", "n": 3}), json!("{\"probe\":\"Tokyo\"}")])
            .field("time", [1, 2])
            .field("line", ["a", "b"])
            .field("labelTypes", [json!({"probe": "I"}), Value::Null])
            .build();
        let records = flatten_frames(&[raw], &ColumnTransforms::standard()).unwrap();

        assert_eq!(records[0].labels.probe(), Some("Paris"));
        assert_eq!(records[0].labels.get("n"), Some("3"));
        assert_eq!(records[0].label_types.get("probe").map(String::as_str), Some("I"));
        assert_eq!(records[1].labels.probe(), Some("Tokyo"));
        assert!(records[1].label_types.is_empty());
    }

    #[test]
    fn test_bad_time_is_malformed() {
        let raw = RawLogFrame::builder()
            .field("labels", [json!({})])
            .field("time", ["yesterday"])
            .field("line", ["a"])
            .build();
        let err = flatten_frames(&[raw], &ColumnTransforms::standard()).unwrap_err();
        assert!(err.to_string().contains("row 0"));
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let a = ParsedLogRecord::builder().time(1).id("a").line("one").build();
        let b = ParsedLogRecord::builder().time(2).id("b").build();
        let a_again = ParsedLogRecord::builder().time(1).id("a").line("other").build();
        let anon = ParsedLogRecord::builder().time(3).line("x").build();
        let anon_again = ParsedLogRecord::builder().time(3).line("x").build();

        let out = dedupe_records(vec![a.clone(), b.clone(), a_again, anon.clone(), anon_again]);
        assert_eq!(out, vec![a, b, anon]);
    }

    #[test]
    fn test_records_to_frame_flattens_back() {
        let raw = frame(&[2_000, 1_000], Some(&["2000000007", "1000000003"][..]));
        let records = flatten_frames(&[raw], &ColumnTransforms::standard()).unwrap();

        let encoded = records_to_frame(&records);
        assert_eq!(encoded.row_count(), 2);
        let again = flatten_frames(&[encoded], &ColumnTransforms::standard()).unwrap();
        assert_eq!(again, records);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(json!("42")), json!(42));
        assert_eq!(coerce_number(json!("1.5")), json!(1.5));
        assert_eq!(coerce_number(json!("abc")), json!("abc"));
        assert_eq!(coerce_number(json!(7)), json!(7));
    }
}
