//! Time conversion helpers.

use chrono::{DateTime, TimeZone, Utc};

/// Seconds between the Windows FILETIME epoch (1601-01-01) and the Unix
/// epoch (1970-01-01).
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

/// Convert a Windows FILETIME value (100-nanosecond ticks since 1601)
/// to a UTC timestamp. Returns `None` for values before the Unix epoch
/// or too large to represent.
pub fn filetime_to_datetime(filetime: u64) -> Option<DateTime<Utc>> {
    let unix_millis = (filetime / 10_000) as i64 - FILETIME_UNIX_OFFSET_SECS * 1000;
    if unix_millis < 0 {
        return None;
    }
    Utc.timestamp_millis_opt(unix_millis).single()
}

/// Convert a Unix timestamp in seconds (as reputation services report
/// account creation) to a UTC timestamp.
pub fn unix_secs_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

/// Average days per year / month, matching how the account-age buckets
/// were originally computed.
const DAYS_PER_YEAR: f64 = 365.25;
const DAYS_PER_MONTH: f64 = 30.44;

/// Derive a human-readable account-age bucket from a creation time.
///
/// Under a year the age is reported in whole months ("3 months ago",
/// "Less than 1 month ago"); from a year up, in whole years.
pub fn account_age_bucket(created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let created = match created {
        Some(t) => t,
        None => return "Unknown".to_string(),
    };

    let elapsed_days = (now - created).num_days() as f64;
    if elapsed_days < 0.0 {
        return "Unknown".to_string();
    }

    let years = (elapsed_days / DAYS_PER_YEAR).floor() as i64;
    if years == 0 {
        let months = (elapsed_days / DAYS_PER_MONTH).floor() as i64;
        if months == 0 {
            "Less than 1 month ago".to_string()
        } else if months == 1 {
            "1 month ago".to_string()
        } else {
            format!("{} months ago", months)
        }
    } else if years == 1 {
        "1 year ago".to_string()
    } else {
        format!("{} years ago", years)
    }
}
