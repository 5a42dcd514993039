//! Data-source seams and the FlightSource stage.
//!
//! `StateSource` and `RouteSource` are the two remote services. The OpenSky
//! client implements both; tests substitute scripted sources.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use flightfinder_core::geo::{self, BoundingBox};
use flightfinder_core::routes::{FlightRecord, TimeWindow};
use flightfinder_core::states::{self, StatesResponse};
use flightfinder_core::{AircraftState, Coordinate, FetchError};

/// Primary service: every aircraft state inside a box.
#[async_trait]
pub trait StateSource: Send + Sync {
    async fn states_in(&self, bbox: &BoundingBox) -> Result<StatesResponse, FetchError>;
}

/// Secondary service: flight history of one aircraft.
#[async_trait]
pub trait RouteSource: Send + Sync {
    async fn route_history(
        &self,
        icao24: &str,
        window: TimeWindow,
    ) -> Result<Vec<FlightRecord>, FetchError>;
}

/// Fetches and normalizes the aircraft around a search centre.
#[derive(Clone)]
pub struct FlightSource {
    states: Arc<dyn StateSource>,
    timeout: Duration,
}

impl FlightSource {
    pub fn new(states: Arc<dyn StateSource>, timeout: Duration) -> Self {
        FlightSource { states, timeout }
    }

    /// Airborne, positioned aircraft inside the box around `center`, in
    /// source order.
    pub async fn fetch(
        &self,
        center: &Coordinate,
        radius_miles: f64,
    ) -> Result<Vec<AircraftState>, FetchError> {
        let bbox = geo::bounding_box(center, radius_miles);
        debug!(
            min_lat = bbox.min_lat,
            max_lat = bbox.max_lat,
            min_lon = bbox.min_lon,
            max_lon = bbox.max_lon,
            "querying flight states"
        );

        let response = tokio::time::timeout(self.timeout, self.states.states_in(&bbox))
            .await
            .map_err(|_| FetchError::Timeout {
                after: self.timeout,
            })??;

        let reported = response.states.as_ref().map_or(0, Vec::len);
        let flights = states::normalize_states(response)?;
        debug!(reported, airborne = flights.len(), "normalized flight states");
        Ok(flights)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
