//! Route-history records from the secondary source.

use std::time::Duration;

use serde::Deserialize;

use crate::types::{FetchError, Route, UNKNOWN_AIRPORT};

/// One historical flight of an aircraft.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    pub icao24: Option<String>,
    pub first_seen: Option<i64>,
    pub last_seen: Option<i64>,
    pub est_departure_airport: Option<String>,
    pub est_arrival_airport: Option<String>,
    pub callsign: Option<String>,
}

/// Unix-second query window `[begin, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub begin: i64,
    pub end: i64,
}

impl TimeWindow {
    /// Window of `span` ending at `now`.
    pub fn trailing(now: i64, span: Duration) -> Self {
        TimeWindow {
            begin: now - span.as_secs() as i64,
            end: now,
        }
    }
}

pub fn parse_records(body: &str) -> Result<Vec<FlightRecord>, FetchError> {
    let records: Option<Vec<FlightRecord>> =
        serde_json::from_str(body).map_err(|e| FetchError::ParseFailure(e.to_string()))?;
    Ok(records.unwrap_or_default())
}

/// Route of the most recent record (the last one), if any.
pub fn latest_route(records: &[FlightRecord]) -> Option<Route> {
    let last = records.last()?;
    Some(Route {
        origin: airport_or_sentinel(last.est_departure_airport.as_deref()),
        destination: airport_or_sentinel(last.est_arrival_airport.as_deref()),
    })
}

fn airport_or_sentinel(code: Option<&str>) -> String {
    match code.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => UNKNOWN_AIRPORT.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
