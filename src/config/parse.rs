//! Parsers for the loosely formatted scalar values found in config files.

use std::time::Duration;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Interpret a flag value.
///
/// `true`, `yes`, `y`, `1` and `enable` are true, case-insensitively.
/// Everything else, including unrecognised words, is false.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1" | "enable"
    )
}

/// Parse a duration such as `250ms`, `30s`, `5min` or `2h`.
///
/// Accepted suffixes are `ms`, `s`/`sec`, `m`/`min` and `h`/`hour`. A bare
/// integer counts nanoseconds. Values that overflow are rejected.
///
/// ```
/// use std::time::Duration;
///
/// use wiresession::config::parse_duration;
///
/// assert_eq!(parse_duration("1500ms"), Some(Duration::from_millis(1500)));
/// assert_eq!(parse_duration("2min"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_duration("soon"), None);
/// ```
#[must_use]
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim().to_ascii_lowercase();
    let units: [(&str, fn(u64) -> Option<Duration>); 7] = [
        ("ms", |n| Some(Duration::from_millis(n))),
        ("sec", |n| Some(Duration::from_secs(n))),
        ("s", |n| Some(Duration::from_secs(n))),
        ("min", |n| n.checked_mul(60).map(Duration::from_secs)),
        ("m", |n| n.checked_mul(60).map(Duration::from_secs)),
        ("hour", |n| n.checked_mul(3600).map(Duration::from_secs)),
        ("h", |n| n.checked_mul(3600).map(Duration::from_secs)),
    ];
    for (suffix, unit) in units {
        if let Some(digits) = value.strip_suffix(suffix) {
            return digits.trim().parse().ok().and_then(unit);
        }
    }
    value.parse().ok().map(Duration::from_nanos)
}

/// Parse a byte count such as `512`, `4k`, `16mb` or `1g`.
///
/// Units are powers of 1024. Returns `None` on malformed input or overflow.
#[must_use]
pub fn parse_byte_size(value: &str) -> Option<u64> {
    let value = value.trim().to_ascii_lowercase();
    let (digits, unit) = [("kb", KB), ("k", KB), ("mb", MB), ("m", MB), ("gb", GB), ("g", GB)]
        .into_iter()
        .find_map(|(suffix, unit)| value.strip_suffix(suffix).map(|d| (d, unit)))
        .unwrap_or((value.as_str(), 1));
    digits.trim().parse::<u64>().ok()?.checked_mul(unit)
}

/// Split a comma-delimited list, trimming entries and dropping empty ones.
#[must_use]
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}
