//! Timestamp wire format
//!
//! Review Board renders every date as `YYYY-MM-DD HH:MM:SS` with no zone
//! designator. Values are read and written as UTC.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Wire format used for timestamps in responses and query filters
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a wire timestamp into an absolute point in time
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::decode_with(format!("Invalid timestamp '{value}': {e}"), e))
}

/// Render a point in time in the wire format
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Serde adapter for wire timestamps, usable with `#[serde(with = "...")]`
pub mod wire {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}
