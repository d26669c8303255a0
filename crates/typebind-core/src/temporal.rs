//! # Temporal Types — Millisecond UTC Timestamps
//!
//! Defines `Timestamp`, the canonical stored form of date-time fields: a UTC
//! instant truncated to millisecond precision.
//!
//! Millisecond truncation happens at every construction path, including
//! [`Timestamp::now()`], so a timestamp always survives a round trip through
//! its text form (`to_iso8601()` → `parse_lenient()`) unchanged.
//!
//! Parsing is lenient: any RFC 3339 offset is accepted and converted to UTC,
//! and a bare calendar date (`2026-01-15`) is read as midnight UTC.

use chrono::{DateTime, NaiveDate, SecondsFormat, Timelike, Utc};

use crate::error::TimestampError;

/// A UTC timestamp truncated to millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to milliseconds.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating
    /// sub-millisecond components.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_millis(dt))
    }

    /// Parse RFC 3339 text with any offset, or a bare `YYYY-MM-DD` date.
    ///
    /// # Errors
    ///
    /// Returns `TimestampError::Unparseable` if the text matches neither form.
    pub fn parse_lenient(s: &str) -> Result<Self, TimestampError> {
        let trimmed = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::from_utc(dt.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Self(naive.and_utc()))
            .ok_or_else(|| TimestampError::Unparseable(s.to_string()))
    }

    /// Create a timestamp from milliseconds since the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns `TimestampError::OutOfRange` if chrono cannot represent it.
    pub fn from_epoch_millis(millis: i64) -> Result<Self, TimestampError> {
        DateTime::from_timestamp_millis(millis)
            .map(Self)
            .ok_or(TimestampError::OutOfRange(millis))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Milliseconds since the Unix epoch.
    pub fn epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Render as RFC 3339 with millisecond precision and `Z` suffix
    /// (e.g., `2026-01-15T12:00:00.000Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_utc(dt)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    let millis = dt.nanosecond() / 1_000_000 * 1_000_000;
    dt.with_nanosecond(millis).unwrap_or(dt)
}
