//! Column table for the ride list. Each column pairs a header label with an
//! extractor; the extracted [`Cell`] formats itself.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::warn;

use crate::models::ride::Ride;

/// Bogotá has no daylight saving, so a fixed offset is exact.
const DISPLAY_OFFSET_SECS: i32 = 5 * 3600;
const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M";

pub struct Column {
    pub label: &'static str,
    pub extract: fn(&Ride) -> Cell,
}

pub const RIDE_COLUMNS: &[Column] = &[
    Column {
        label: "Id",
        extract: |ride| Cell::Id(ride.id),
    },
    Column {
        label: "Hora de solicitud",
        extract: |ride| Cell::Timestamp(ride.request_time),
    },
    Column {
        label: "Hora de inicio del viaje",
        extract: |ride| Cell::Timestamp(ride.start_time),
    },
    Column {
        label: "Hora de finalización del viaje",
        extract: |ride| Cell::Timestamp(ride.end_time),
    },
    Column {
        label: "Tiempo de viaje",
        extract: |ride| Cell::Elapsed(trip_duration(ride)),
    },
    Column {
        label: "Tiempo de espera",
        extract: |ride| Cell::Elapsed(wait_duration(ride)),
    },
    Column {
        label: "Estado",
        extract: |ride| Cell::Text(ride.status.to_string()),
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Id(i64),
    Timestamp(Option<DateTime<Utc>>),
    Elapsed(Elapsed),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Id(id) => write!(f, "{id}"),
            Cell::Timestamp(Some(ts)) => write!(f, "{}", format_timestamp(*ts)),
            Cell::Timestamp(None) => f.write_str("–"),
            Cell::Elapsed(elapsed) => write!(f, "{elapsed}"),
            Cell::Text(text) => f.write_str(text),
        }
    }
}

/// Whole minutes between two ride events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elapsed {
    NotApplicable,
    Minutes(i64),
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Elapsed::NotApplicable => f.write_str("N/A"),
            Elapsed::Minutes(minutes) => write!(f, "{}h {}m", minutes / 60, minutes % 60),
        }
    }
}

pub fn headers() -> Vec<&'static str> {
    RIDE_COLUMNS.iter().map(|column| column.label).collect()
}

pub fn render_row(ride: &Ride) -> Vec<String> {
    RIDE_COLUMNS
        .iter()
        .map(|column| (column.extract)(ride).to_string())
        .collect()
}

pub fn trip_duration(ride: &Ride) -> Elapsed {
    elapsed_between(ride, "trip", ride.start_time, ride.end_time)
}

pub fn wait_duration(ride: &Ride) -> Elapsed {
    elapsed_between(ride, "wait", ride.request_time, ride.start_time)
}

/// Canceled rides and missing endpoints have no duration. A negative span
/// is clamped to zero and logged.
fn elapsed_between(
    ride: &Ride,
    kind: &str,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Elapsed {
    if ride.status.is_canceled() {
        return Elapsed::NotApplicable;
    }
    let (Some(from), Some(to)) = (from, to) else {
        return Elapsed::NotApplicable;
    };
    let minutes = (to - from).num_minutes();
    if minutes < 0 {
        warn!(ride_id = ride.id, kind, minutes, "negative ride duration clamped to zero");
        return Elapsed::Minutes(0);
    }
    Elapsed::Minutes(minutes)
}

fn display_offset() -> FixedOffset {
    FixedOffset::west_opt(DISPLAY_OFFSET_SECS).expect("UTC-05:00 is within a day")
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&display_offset())
        .format(DISPLAY_FORMAT)
        .to_string()
}
