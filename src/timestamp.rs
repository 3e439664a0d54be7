use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};

/// Zoned layouts, tried first
const ZONED_FORMATS: [&str; 2] = [
    // Squid %tl / Apache common log: "10/Oct/2000:13:55:36 -0700"
    "%d/%b/%Y:%H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S %z",
];

/// Layouts without an offset, interpreted in the local zone
const NAIVE_FORMATS: [&str; 5] = [
    "%d/%b/%Y:%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Best-effort timestamp parsing across the layouts seen in proxy logs.
///
/// Returns `None` instead of an error; callers substitute the current time.
pub fn parse_timestamp(input: &str) -> Option<DateTime<FixedOffset>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some(ts) = parse_epoch(input) {
        return Some(ts);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt);
    }

    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            if let Some(local) = Local.from_local_datetime(&naive).earliest() {
                return Some(local.fixed_offset());
            }
        }
    }

    None
}

/// Unix epoch seconds with an optional fractional part, e.g. `1157689324.156`
pub fn parse_epoch(input: &str) -> Option<DateTime<FixedOffset>> {
    let (secs, frac) = match input.split_once('.') {
        Some((secs, frac)) => (secs, frac),
        None => (input, ""),
    };
    if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let secs: i64 = secs.parse().ok()?;
    let nanos = if frac.is_empty() {
        0
    } else {
        let digits: String = frac.chars().chain(std::iter::repeat('0')).take(9).collect();
        digits.parse::<u32>().ok()?
    };

    let utc = DateTime::from_timestamp(secs, nanos)?;
    Some(utc.with_timezone(&Local).fixed_offset())
}

/// True if the token looks like an epoch timestamp (digits, optional fraction)
pub fn is_epoch_token(token: &str) -> bool {
    parse_epoch(token).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_common_log_timestamp_keeps_offset() {
        let ts = parse_timestamp("10/Oct/2000:13:55:36 -0700").unwrap();
        assert_eq!(ts.hour(), 13);
        assert_eq!(ts.offset().local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn test_rfc3339() {
        let ts = parse_timestamp("2024-03-01T08:15:00Z").unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.hour(), 8);
    }

    #[test]
    fn test_naive_layouts() {
        assert!(parse_timestamp("2024-03-01 08:15:00").is_some());
        assert!(parse_timestamp("01/Mar/2024:08:15:00").is_some());
    }

    #[test]
    fn test_epoch_with_fraction() {
        let ts = parse_epoch("1157689324.156").unwrap();
        assert_eq!(ts.timestamp(), 1157689324);
        assert_eq!(ts.timestamp_subsec_millis(), 156);
        assert!(is_epoch_token("1700000000"));
        assert!(!is_epoch_token("17000a"));
        assert!(!is_epoch_token(".5"));
        assert!(!is_epoch_token("1.2.3"));
    }

    #[test]
    fn test_garbage_is_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday-ish").is_none());
    }
}
