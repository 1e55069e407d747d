//! Date parsing for values read back from the hosted store.
//!
//! The store returns period bounds and observation dates either as plain
//! calendar dates (`2024-01-15`) or as full timestamps
//! (`2024-01-15T00:00:00.000Z`, `2024-01-15T00:00:00+00:00`). Only the
//! calendar day matters to the client, so everything is normalized to
//! [`NaiveDate`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serializer};

/// Parses a calendar date from any of the formats the store emits.
#[must_use]
pub fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.date());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.date());
    }
    None
}

/// `#[serde(with = "...")]` adapter for [`NaiveDate`] fields.
pub mod flexible {
    use super::{Deserialize, Deserializer, NaiveDate, Serializer, parse_flexible_date};

    /// Serializes as `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    /// Deserializes from a date or timestamp string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a recognizable date.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_flexible_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_date() {
        assert_eq!(
            parse_flexible_date("2024-01-15"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn parses_rfc3339_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_flexible_date("2024-01-15T00:00:00.000Z"), expected);
        assert_eq!(parse_flexible_date("2024-01-15T10:30:00+00:00"), expected);
    }

    #[test]
    fn parses_naive_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_flexible_date("2024-01-15T10:30:00"), expected);
        assert_eq!(parse_flexible_date("2024-01-15 10:30:00.123"), expected);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_flexible_date("yesterday").is_none());
        assert!(parse_flexible_date("").is_none());
    }
}
