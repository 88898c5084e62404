//! Billing date parsing
//!
//! All day arithmetic happens in UTC. A date with an explicit offset is
//! converted to UTC before its day is taken; a date without one is read as UTC.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Parse a billing date string into its UTC calendar day.
///
/// Returns `None` for anything that isn't RFC 3339, a bare `YYYY-MM-DD`, or a
/// naive `YYYY-MM-DD[T ]HH:MM:SS[.fff]` timestamp.
pub fn parse_billing_day(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at.to_offset(UtcOffset::UTC).date());
    }

    if let Ok(date) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Some(date);
    }

    let naive_formats = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    ];

    naive_formats
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(raw, *format).ok())
        .map(|naive| naive.date())
}

/// Today's date in UTC for the given instant
pub fn utc_day(now: OffsetDateTime) -> Date {
    now.to_offset(UtcOffset::UTC).date()
}
