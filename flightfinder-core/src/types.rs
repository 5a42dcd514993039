//! Shared types, error taxonomy, and flight records for flightfinder-core.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Callsign substituted when the source reports none (or only whitespace).
pub const UNKNOWN_CALLSIGN: &str = "Unknown";

/// Airport code substituted when a route record lacks an estimate.
pub const UNKNOWN_AIRPORT: &str = "N/A";

pub const MILES_TO_KM: f64 = 1.60934;

const METERS_TO_FEET: f64 = 3.28084;
const MPS_TO_MPH: f64 = 2.23694;
const MPS_TO_FPM: f64 = 196.85;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Which half of a coordinate an input error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    pub fn limit(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Latitude => write!(f, "Latitude"),
            Axis::Longitude => write!(f, "Longitude"),
        }
    }
}

/// Rejected manual coordinate input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    #[error("Please enter valid latitude and longitude values.")]
    NotANumber { axis: Axis },
    #[error("{axis} must be between -{limit} and {limit}.", limit = .axis.limit())]
    OutOfRange { axis: Axis, value: f64 },
}

/// Failure to resolve the reference coordinate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("Geolocation is not supported on this system")]
    Unsupported,
    #[error("Unable to get your location. Please allow location access.")]
    PermissionDenied,
    #[error("Unable to get your location. Location information is unavailable.")]
    Unavailable,
    #[error("Unable to get your location. Location request timed out.")]
    Timeout,
    #[error("Unable to get your location. An unknown error occurred.")]
    Unknown,
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
}

/// Failure of a request against either data source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Failed to fetch flight data: HTTP {code}")]
    HttpStatus { code: u16 },
    #[error("Failed to parse flight data: {0}")]
    ParseFailure(String),
    #[error("Error fetching flights: {0}")]
    Transport(String),
    #[error("Flight data request timed out after {after:?}")]
    Timeout { after: Duration },
}

/// Why one flight could not be enriched. Recorded and logged, never escalated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnrichmentItemError {
    #[error("route lookup for {icao24} failed: {source}")]
    Fetch { icao24: String, source: FetchError },
    #[error("no route history for {icao24}")]
    NoRecords { icao24: String },
}

/// A blocking-stage failure that ends a search session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A validated WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range components.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidInputError> {
        if !latitude.is_finite() {
            return Err(InvalidInputError::NotANumber {
                axis: Axis::Latitude,
            });
        }
        if !longitude.is_finite() {
            return Err(InvalidInputError::NotANumber {
                axis: Axis::Longitude,
            });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidInputError::OutOfRange {
                axis: Axis::Latitude,
                value: latitude,
            });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidInputError::OutOfRange {
                axis: Axis::Longitude,
                value: longitude,
            });
        }
        Ok(Coordinate {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

// ---------------------------------------------------------------------------
// Flight records
// ---------------------------------------------------------------------------

/// Normalized snapshot of one airborne aircraft from the primary source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AircraftState {
    /// ICAO 24-bit transponder address, lowercase hex as the source reports it.
    pub icao24: String,
    pub callsign: String,
    pub origin_country: String,
    pub coordinate: Coordinate,
    pub altitude_m: Option<f64>,
    pub ground_speed_mps: Option<f64>,
    pub heading_deg: Option<f64>,
    pub vertical_rate_mps: Option<f64>,
    pub on_ground: bool,
}

impl AircraftState {
    pub fn altitude_ft(&self) -> Option<i64> {
        self.altitude_m.map(|m| (m * METERS_TO_FEET).round() as i64)
    }

    pub fn speed_mph(&self) -> Option<i64> {
        self.ground_speed_mps.map(|v| (v * MPS_TO_MPH).round() as i64)
    }

    pub fn heading_rounded(&self) -> Option<i64> {
        self.heading_deg.map(|h| h.round() as i64)
    }

    pub fn vertical_trend(&self) -> VerticalTrend {
        let fpm = self
            .vertical_rate_mps
            .map(|v| (v * MPS_TO_FPM).round() as i64)
            .unwrap_or(0);
        match fpm {
            0 => VerticalTrend::Level,
            v if v > 0 => VerticalTrend::Climbing(v),
            v => VerticalTrend::Descending(v.abs()),
        }
    }
}

/// Climb/descent indication in feet per minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerticalTrend {
    Climbing(i64),
    Descending(i64),
    Level,
}

impl fmt::Display for VerticalTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerticalTrend::Climbing(v) => write!(f, "Climbing ({v} ft/min)"),
            VerticalTrend::Descending(v) => write!(f, "Descending ({v} ft/min)"),
            VerticalTrend::Level => write!(f, "Level"),
        }
    }
}

/// Estimated origin and destination airports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub origin: String,
    pub destination: String,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.origin, self.destination)
    }
}

/// An in-radius aircraft with its distance from the reference point.
///
/// Distances are fixed at construction; only `route` changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFlight {
    #[serde(flatten)]
    pub state: AircraftState,
    distance_km: f64,
    distance_miles: f64,
    pub route: Option<Route>,
}

impl RankedFlight {
    pub fn new(state: AircraftState, distance_km: f64, distance_miles: f64) -> Self {
        RankedFlight {
            state,
            distance_km,
            distance_miles,
            route: None,
        }
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn distance_miles(&self) -> f64 {
        self.distance_miles
    }

    pub fn icao24(&self) -> &str {
        &self.state.icao24
    }

    pub fn callsign(&self) -> &str {
        &self.state.callsign
    }

    pub fn route_text(&self) -> String {
        match &self.route {
            Some(r) => r.to_string(),
            None => "Loading route...".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
