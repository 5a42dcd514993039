//! LocationProvider resolves the reference coordinate for a search.
//!
//! Two paths share one contract: manual entry (validated in the core crate)
//! and a position sensor bounded by the configured timeout. The shipped
//! sensor asks an IP geolocation service; without a sensor the device path
//! fails as unsupported.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use flightfinder_core::location::{self, PositionRequest, SensorFailure};
use flightfinder_core::{Coordinate, LocationError};

/// Something that can report the current position.
#[async_trait]
pub trait PositionSensor: Send + Sync {
    async fn current_position(&self, request: &PositionRequest)
        -> Result<Coordinate, SensorFailure>;
}

/// Where the search centre comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationRequest {
    /// Ask the position sensor.
    Device,
    /// User-typed values, validated before use.
    Manual { lat: String, lon: String },
}

#[derive(Clone)]
pub struct LocationProvider {
    sensor: Option<Arc<dyn PositionSensor>>,
    timeout: Duration,
}

impl LocationProvider {
    pub fn new(sensor: Option<Arc<dyn PositionSensor>>, timeout: Duration) -> Self {
        LocationProvider { sensor, timeout }
    }

    pub async fn locate(&self, request: &LocationRequest) -> Result<Coordinate, LocationError> {
        match request {
            LocationRequest::Manual { lat, lon } => Ok(location::parse_manual(lat, lon)?),
            LocationRequest::Device => {
                let sensor = self.sensor.as_ref().ok_or(LocationError::Unsupported)?;
                let position_request = PositionRequest::fresh(self.timeout);
                let fix = tokio::time::timeout(
                    self.timeout,
                    sensor.current_position(&position_request),
                )
                .await
                .map_err(|_| LocationError::Timeout)?;
                let coordinate = fix.map_err(LocationError::from)?;
                info!(lat = coordinate.latitude(), lon = coordinate.longitude(), "position fix");
                Ok(coordinate)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// IP geolocation sensor
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate position from the public IP address (ip-api.com protocol).
pub struct IpGeolocationSensor {
    base_url: String,
    client: reqwest::Client,
}

impl IpGeolocationSensor {
    pub fn new(base_url: &str) -> Self {
        IpGeolocationSensor {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PositionSensor for IpGeolocationSensor {
    async fn current_position(
        &self,
        request: &PositionRequest,
    ) -> Result<Coordinate, SensorFailure> {
        let url = format!("{}/json/", self.base_url);
        debug!(%url, "requesting IP geolocation");

        let resp = self
            .client
            .get(&url)
            .query(&[("fields", "status,message,lat,lon")])
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SensorFailure::Timeout
                } else {
                    warn!(error = %e, "geolocation service unreachable");
                    SensorFailure::PositionUnavailable
                }
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(SensorFailure::PermissionDenied);
        }
        if !status.is_success() {
            return Err(SensorFailure::PositionUnavailable);
        }

        let body: IpApiResponse = resp
            .json()
            .await
            .map_err(|e| SensorFailure::Other(e.to_string()))?;

        if body.status != "success" {
            warn!(message = ?body.message, "geolocation lookup failed");
            return Err(SensorFailure::PositionUnavailable);
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => {
                Coordinate::new(lat, lon).map_err(|e| SensorFailure::Other(e.to_string()))
            }
            _ => Err(SensorFailure::PositionUnavailable),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
