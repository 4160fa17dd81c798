//! Date helper functions

use chrono::{DateTime, Local, TimeZone, Utc};

/// Format used for "Published at" lines, e.g. `10/18/2026, 3:04:05 PM`
pub const PUBLISHED_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Format a date in the given zone
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format(format).to_string()
}

/// Publication timestamp in local time, falling back to now when the backend omits it
pub fn published_at(created_at: Option<&DateTime<Utc>>) -> String {
    let local = match created_at {
        Some(date) => date.with_timezone(&Local),
        None => Local::now(),
    };
    format_date(&local, PUBLISHED_FORMAT)
}
