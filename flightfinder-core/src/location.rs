//! Reference-point resolution that needs no I/O.
//!
//! Manual entry is parsed and range-checked here. Position sensors live in
//! the server crate; they report a `SensorFailure` which maps onto the
//! user-facing `LocationError` causes.

use std::time::Duration;

use crate::types::{Axis, Coordinate, InvalidInputError, LocationError};

/// How a sensor should be asked for a fix.
///
/// `high_accuracy` and `maximum_age` are hints for device receivers. The IP
/// geolocation sensor only honours `timeout`: a lookup has no accuracy mode
/// or cache to control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRequest {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the sensor may return. Zero forces a fresh reading.
    pub maximum_age: Duration,
}

impl PositionRequest {
    pub fn fresh(timeout: Duration) -> Self {
        PositionRequest {
            high_accuracy: true,
            timeout,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Failure reported by a position sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorFailure {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Other(String),
}

impl From<SensorFailure> for LocationError {
    fn from(f: SensorFailure) -> Self {
        match f {
            SensorFailure::PermissionDenied => LocationError::PermissionDenied,
            SensorFailure::PositionUnavailable => LocationError::Unavailable,
            SensorFailure::Timeout => LocationError::Timeout,
            SensorFailure::Other(_) => LocationError::Unknown,
        }
    }
}

/// Parse user-typed latitude/longitude strings.
///
/// Both values are checked for being numbers before either range is checked.
pub fn parse_manual(lat: &str, lon: &str) -> Result<Coordinate, InvalidInputError> {
    let lat_val = parse_number(lat, Axis::Latitude)?;
    let lon_val = parse_number(lon, Axis::Longitude)?;
    Coordinate::new(lat_val, lon_val)
}

fn parse_number(text: &str, axis: Axis) -> Result<f64, InvalidInputError> {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(InvalidInputError::NotANumber { axis }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
