//! Date helpers shared by the document types.
//!
//! The document store keeps datetimes with millisecond precision,
//! so every timestamp is truncated to milliseconds before it is
//! stored. This keeps a document equal to itself after a round trip.

use chrono::{DateTime, NaiveDate, Utc};

/// Truncate a timestamp to the precision of a BSON datetime
pub fn to_store_precision(datetime: DateTime<Utc>) -> DateTime<Utc> {
    bson::DateTime::from_chrono(datetime).to_chrono()
}

/// The current time at store precision
pub fn now() -> DateTime<Utc> {
    to_store_precision(Utc::now())
}

/// Midnight UTC on the given calendar day, or None if the
/// day does not exist.
pub fn utc_date(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
