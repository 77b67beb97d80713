use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
    ("d", 86_400_000_000_000.0),
];

/// Parse duration strings like "10s", "250ms", "3h", "31d", "1.5m"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            if !val.is_finite() || val < 0.0 {
                bail!("Duration must be a non-negative number: {}", s);
            }
            return Ok(Duration::from_nanos((val * multiplier) as u64));
        }
    }

    bail!("Unknown duration format: {}", s)
}

/// Parse a duration string into whole milliseconds.
pub fn parse_duration_ms(s: &str) -> Result<i64> {
    Ok(i64::try_from(parse_duration(s)?.as_millis())?)
}

/// Format a millisecond interval compactly, e.g. "1m", "1h30m", "500ms"
pub fn format_interval_ms(ms: i64) -> String {
    if ms <= 0 {
        return "0s".to_string();
    }
    if ms < 1_000 {
        return format!("{}ms", ms);
    }

    let mut secs = ms / 1_000;
    let mut out = String::new();
    for (unit, size) in [("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)] {
        if secs >= size {
            out.push_str(&format!("{}{}", secs / size, unit));
            secs %= size;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        let d = parse_duration("29.992671083s").unwrap();
        assert!((d.as_secs_f64() - 29.992671083).abs() < 0.0001);
    }

    #[test]
    fn test_parse_milliseconds() {
        let d = parse_duration("988.82775ms").unwrap();
        assert!((d.as_secs_f64() - 0.98882775).abs() < 0.0001);
    }

    #[test]
    fn test_parse_microseconds() {
        let d = parse_duration("16.958µs").unwrap();
        assert_eq!(d.as_nanos(), 16958);
    }

    #[test]
    fn test_parse_long_units() {
        assert_eq!(parse_duration_ms("10s").unwrap(), 10_000);
        assert_eq!(parse_duration_ms("1.5m").unwrap(), 90_000);
        assert_eq!(parse_duration_ms("3h").unwrap(), 10_800_000);
        assert_eq!(parse_duration_ms("31d").unwrap(), 2_678_400_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("-5s").is_err());
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval_ms(500), "500ms");
        assert_eq!(format_interval_ms(60_000), "1m");
        assert_eq!(format_interval_ms(5_400_000), "1h30m");
        assert_eq!(format_interval_ms(0), "0s");
    }
}
