//! Relative timestamp labels for the session list.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Number of (partial) days between two instants, rounded up.
///
/// Any elapsed time up to and including 24h counts as one day, so a
/// timestamp 24h and one minute old is two days away.
pub fn day_difference<Tz: TimeZone>(timestamp: &DateTime<Tz>, now: &DateTime<Tz>) -> i64 {
    let millis = (now.clone() - timestamp.clone()).num_milliseconds().abs();
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Format a session timestamp relative to `now`.
///
/// ```ignore
/// format_relative(&now, &now) == "Today"
/// format_relative(&(now - Duration::days(7)), &now) == "6 days ago"
/// ```
///
/// Anything older than a week falls back to a `M/D/YYYY` date in the
/// timestamp's own zone.
pub fn format_relative<Tz>(timestamp: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match day_difference(timestamp, now) {
        0 | 1 => "Today".to_string(),
        2 => "Yesterday".to_string(),
        n @ 3..=7 => format!("{} days ago", n - 1),
        _ => timestamp.format("%-m/%-d/%Y").to_string(),
    }
}
