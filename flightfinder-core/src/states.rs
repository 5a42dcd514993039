//! Primary-source state vectors and their normalization.
//!
//! The flight-state service answers with an array of positional arrays,
//! one per aircraft. Index layout:
//!
//! | idx | field           | unit |
//! |-----|-----------------|------|
//! | 0   | icao24          |      |
//! | 1   | callsign        |      |
//! | 2   | origin_country  |      |
//! | 5   | longitude       | deg  |
//! | 6   | latitude        | deg  |
//! | 7   | baro_altitude   | m    |
//! | 8   | on_ground       |      |
//! | 9   | velocity        | m/s  |
//! | 10  | true_track      | deg  |
//! | 11  | vertical_rate   | m/s  |

use serde::Deserialize;
use serde_json::Value;

use crate::types::{AircraftState, Coordinate, FetchError, UNKNOWN_CALLSIGN};

/// Minimum row length carrying every field we read.
const MIN_ROW_LEN: usize = 12;

/// Top-level response body of the state query.
#[derive(Debug, Clone, Deserialize)]
pub struct StatesResponse {
    pub time: Option<i64>,
    pub states: Option<Vec<Vec<Value>>>,
}

/// One state vector as delivered, before any filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RawState {
    pub icao24: String,
    pub callsign: Option<String>,
    pub origin_country: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub baro_altitude: Option<f64>,
    pub on_ground: bool,
    pub velocity: Option<f64>,
    pub true_track: Option<f64>,
    pub vertical_rate: Option<f64>,
}

impl RawState {
    /// Read the positional fields of one row.
    pub fn from_row(row: &[Value]) -> Result<Self, FetchError> {
        if row.len() < MIN_ROW_LEN {
            return Err(FetchError::ParseFailure(format!(
                "state vector has {} fields, expected at least {MIN_ROW_LEN}",
                row.len()
            )));
        }
        let icao24 = row[0]
            .as_str()
            .ok_or_else(|| FetchError::ParseFailure("state vector without icao24".into()))?
            .to_string();

        Ok(RawState {
            icao24,
            callsign: row[1].as_str().map(str::to_string),
            origin_country: row[2].as_str().map(str::to_string),
            longitude: row[5].as_f64(),
            latitude: row[6].as_f64(),
            baro_altitude: row[7].as_f64(),
            on_ground: row[8].as_bool().unwrap_or(false),
            velocity: row[9].as_f64(),
            true_track: row[10].as_f64(),
            vertical_rate: row[11].as_f64(),
        })
    }

    /// Canonical record, or `None` for grounded or unpositioned aircraft.
    pub fn normalize(self) -> Option<AircraftState> {
        if self.on_ground {
            return None;
        }
        let coordinate = Coordinate::new(self.latitude?, self.longitude?).ok()?;

        Some(AircraftState {
            icao24: self.icao24,
            callsign: normalize_callsign(self.callsign.as_deref()),
            origin_country: self.origin_country.unwrap_or_default(),
            coordinate,
            altitude_m: self.baro_altitude,
            ground_speed_mps: self.velocity,
            heading_deg: self.true_track,
            vertical_rate_mps: self.vertical_rate,
            on_ground: false,
        })
    }
}

/// Trimmed callsign, or the sentinel when absent or blank.
pub fn normalize_callsign(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(cs) if !cs.is_empty() => cs.to_string(),
        _ => UNKNOWN_CALLSIGN.to_string(),
    }
}

/// Parse a response body into airborne, positioned aircraft.
///
/// Order follows the source. An absent or empty `states` list is not an error.
pub fn parse_states(body: &str) -> Result<Vec<AircraftState>, FetchError> {
    let response: StatesResponse =
        serde_json::from_str(body).map_err(|e| FetchError::ParseFailure(e.to_string()))?;
    normalize_states(response)
}

pub fn normalize_states(response: StatesResponse) -> Result<Vec<AircraftState>, FetchError> {
    let rows = response.states.unwrap_or_default();
    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(state) = RawState::from_row(row)?.normalize() {
            out.push(state);
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
