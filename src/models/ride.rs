use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RideStatus {
    Requested,
    Active,
    Completed,
    Canceled,
    /// Anything else the dispatch system writes; passed through untouched.
    Other(String),
}

impl RideStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RideStatus::Requested => "requested",
            RideStatus::Active => "active",
            RideStatus::Completed => "completed",
            RideStatus::Canceled => "canceled",
            RideStatus::Other(raw) => raw,
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, RideStatus::Canceled)
    }
}

impl From<String> for RideStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "requested" => RideStatus::Requested,
            "active" => RideStatus::Active,
            "completed" => RideStatus::Completed,
            "canceled" => RideStatus::Canceled,
            _ => RideStatus::Other(raw),
        }
    }
}

impl From<RideStatus> for String {
    fn from(status: RideStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub name: String,
}

/// One row of `ride_history` with passenger and driver names joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    pub id: i64,
    pub request_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub gender: Option<String>,
    pub affiliate_id: Option<i64>,
    pub status: RideStatus,
    pub passengers: Option<PersonName>,
    pub drivers: Option<PersonName>,
}

/// A page of rides. `total` is an estimate of the whole ride history and
/// must only be used as a hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidePage {
    pub rides: Vec<Ride>,
    pub total: i64,
}

/// Parses a stored timestamp. Accepts RFC 3339 and SQLite's
/// `YYYY-MM-DD HH:MM:SS` (taken as UTC); anything else is dropped.
pub fn parse_stored_timestamp(ride_id: i64, column: &str, raw: Option<String>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }
    warn!(ride_id, column, value = %trimmed, "unparsable ride timestamp");
    None
}
