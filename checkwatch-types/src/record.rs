//! Parsed log records and their label maps.

use std::collections::BTreeMap;

/// Well-known label keys attached to probe log lines.
pub mod label_keys {
    /// Name of the probe that ran the check.
    pub const PROBE: &str = "probe";
    /// Lifecycle message ("Beginning check", "Check succeeded", ...).
    pub const MSG: &str = "msg";
    /// Execution duration in (fractional) seconds, present on terminal records.
    pub const DURATION_SECONDS: &str = "duration_seconds";
    pub const CHECK_NAME: &str = "check_name";
    pub const JOB: &str = "job";
    pub const INSTANCE: &str = "instance";
    pub const LEVEL: &str = "level";
}

/// Label map of a log record.
///
/// Keys are free-form strings; the well-known ones are exposed through typed
/// accessors and anything else is reachable through [`Labels::get`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    /// Create an empty label map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw lookup of any label.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Insert a label, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn probe(&self) -> Option<&str> {
        self.get(label_keys::PROBE)
    }

    pub fn msg(&self) -> Option<&str> {
        self.get(label_keys::MSG)
    }

    pub fn check_name(&self) -> Option<&str> {
        self.get(label_keys::CHECK_NAME)
    }

    pub fn job(&self) -> Option<&str> {
        self.get(label_keys::JOB)
    }

    pub fn instance(&self) -> Option<&str> {
        self.get(label_keys::INSTANCE)
    }

    pub fn level(&self) -> Option<&str> {
        self.get(label_keys::LEVEL)
    }

    /// Execution duration in seconds, if the label is present and numeric.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.get(label_keys::DURATION_SECONDS)?.trim().parse().ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all labels in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl From<BTreeMap<String, String>> for Labels {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One structured log line, flattened out of a columnar frame.
///
/// `ts_ns` is the ordering key for everything downstream; when a frame has no
/// nanosecond column it is derived from `time`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ParsedLogRecord {
    pub labels: Labels,
    /// Unix timestamp in milliseconds.
    pub time: i64,
    /// Unix timestamp in nanoseconds.
    pub ts_ns: i64,
    pub line: String,
    pub id: String,
    pub label_types: BTreeMap<String, String>,
}

impl ParsedLogRecord {
    /// Create a builder for constructing records.
    pub fn builder() -> ParsedLogRecordBuilder {
        ParsedLogRecordBuilder::new()
    }

    /// Shorthand for `labels.msg()`.
    pub fn msg(&self) -> Option<&str> {
        self.labels.msg()
    }

    /// Shorthand for `labels.probe()`.
    pub fn probe(&self) -> Option<&str> {
        self.labels.probe()
    }
}

/// Builder for [`ParsedLogRecord`].
#[derive(Debug, Default)]
pub struct ParsedLogRecordBuilder {
    labels: Labels,
    time: i64,
    ts_ns: Option<i64>,
    line: String,
    id: String,
    label_types: BTreeMap<String, String>,
}

impl ParsedLogRecordBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the millisecond timestamp.
    pub fn time(mut self, time: i64) -> Self {
        self.time = time;
        self
    }

    /// Set an explicit nanosecond timestamp. Defaults to `time * 1_000_000`.
    pub fn ts_ns(mut self, ts_ns: i64) -> Self {
        self.ts_ns = Some(ts_ns);
        self
    }

    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key, value);
        self
    }

    pub fn probe(self, probe: impl Into<String>) -> Self {
        self.label(label_keys::PROBE, probe)
    }

    pub fn msg(self, msg: impl Into<String>) -> Self {
        self.label(label_keys::MSG, msg)
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.line = line.into();
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn label_type(mut self, key: impl Into<String>, kind: impl Into<String>) -> Self {
        self.label_types.insert(key.into(), kind.into());
        self
    }

    /// Build the record.
    pub fn build(self) -> ParsedLogRecord {
        ParsedLogRecord {
            labels: self.labels,
            time: self.time,
            ts_ns: self.ts_ns.unwrap_or(self.time.saturating_mul(1_000_000)),
            line: self.line,
            id: self.id,
            label_types: self.label_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_derives_ts_ns() {
        let record = ParsedLogRecord::builder().time(1_500).probe("Tokyo").build();
        assert_eq!(record.ts_ns, 1_500_000_000);
        assert_eq!(record.probe(), Some("Tokyo"));
    }

    #[test]
    fn test_builder_keeps_explicit_ts_ns() {
        let record = ParsedLogRecord::builder().time(1_500).ts_ns(1_500_000_123).build();
        assert_eq!(record.ts_ns, 1_500_000_123);
    }

    #[test]
    fn test_label_accessors() {
        let labels: Labels = [
            ("probe", "Frankfurt"),
            ("msg", "Check succeeded"),
            ("duration_seconds", "0.25"),
            ("region", "EU"),
        ]
        .into_iter()
        .collect();

        assert_eq!(labels.probe(), Some("Frankfurt"));
        assert_eq!(labels.msg(), Some("Check succeeded"));
        assert_eq!(labels.duration_seconds(), Some(0.25));
        assert_eq!(labels.get("region"), Some("EU"));
        assert!(labels.check_name().is_none());
    }

    #[test]
    fn test_duration_seconds_rejects_garbage() {
        let labels: Labels = [("duration_seconds", "fast")].into_iter().collect();
        assert!(labels.duration_seconds().is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_record_uses_camel_case() {
        let record = ParsedLogRecord::builder()
            .time(1)
            .label_type("probe", "I")
            .build();
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("tsNs").is_some());
        assert!(json.get("labelTypes").is_some());
    }
}
