//! Scripted data sources and sensors shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};

use flightfinder_core::geo::BoundingBox;
use flightfinder_core::location::{PositionRequest, SensorFailure};
use flightfinder_core::routes::{FlightRecord, TimeWindow};
use flightfinder_core::states::StatesResponse;
use flightfinder_core::{AircraftState, Coordinate, FetchError, RankedFlight};

use crate::sensor::PositionSensor;
use crate::source::{RouteSource, StateSource};

/// One positional state vector row.
pub fn state_row(
    icao: &str,
    callsign: &str,
    lat: Option<f64>,
    lon: Option<f64>,
    on_ground: bool,
) -> Value {
    json!([
        icao, callsign, "United States", 1700000000, 1700000000, lon, lat,
        10000.0, on_ground, 220.0, 90.0, 0.0, null, 10100.0, null, false, 0
    ])
}

pub fn ranked(icao: &str, callsign: &str, miles: f64) -> RankedFlight {
    RankedFlight::new(
        AircraftState {
            icao24: icao.into(),
            callsign: callsign.into(),
            origin_country: "United States".into(),
            coordinate: Coordinate::new(40.0, -74.0).unwrap(),
            altitude_m: Some(10000.0),
            ground_speed_mps: Some(220.0),
            heading_deg: Some(90.0),
            vertical_rate_mps: None,
            on_ground: false,
        },
        miles * 1.60934,
        miles,
    )
}

pub fn record(dep: Option<&str>, arr: Option<&str>) -> FlightRecord {
    FlightRecord {
        icao24: None,
        first_seen: None,
        last_seen: None,
        est_departure_airport: dep.map(str::to_string),
        est_arrival_airport: arr.map(str::to_string),
        callsign: None,
    }
}

// ---------------------------------------------------------------------------
// State source
// ---------------------------------------------------------------------------

pub struct ScriptedStates {
    result: Result<StatesResponse, FetchError>,
    delay: Duration,
    bboxes: Mutex<Vec<BoundingBox>>,
}

impl ScriptedStates {
    pub fn rows(rows: Vec<Value>) -> Self {
        let states = rows
            .into_iter()
            .map(|r| match r {
                Value::Array(v) => v,
                other => vec![other],
            })
            .collect();
        Self::response(StatesResponse {
            time: Some(1700000000),
            states: Some(states),
        })
    }

    pub fn response(response: StatesResponse) -> Self {
        ScriptedStates {
            result: Ok(response),
            delay: Duration::ZERO,
            bboxes: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: FetchError) -> Self {
        ScriptedStates {
            result: Err(err),
            delay: Duration::ZERO,
            bboxes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn last_bbox(&self) -> Option<BoundingBox> {
        self.bboxes.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl StateSource for ScriptedStates {
    async fn states_in(&self, bbox: &BoundingBox) -> Result<StatesResponse, FetchError> {
        self.bboxes.lock().unwrap().push(*bbox);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}

// ---------------------------------------------------------------------------
// Route source
// ---------------------------------------------------------------------------

/// Answers per icao24; unknown aircraft get an empty history.
#[derive(Default)]
pub struct ScriptedRoutes {
    answers: HashMap<String, Result<Vec<FlightRecord>, FetchError>>,
    delay: Duration,
    calls: Mutex<Vec<(String, TimeWindow)>>,
    call_times: Mutex<Vec<Instant>>,
}

impl ScriptedRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, icao: &str, dep: &str, arr: &str) -> Self {
        self.answers
            .insert(icao.into(), Ok(vec![record(Some(dep), Some(arr))]));
        self
    }

    pub fn records(mut self, icao: &str, records: Vec<FlightRecord>) -> Self {
        self.answers.insert(icao.into(), Ok(records));
        self
    }

    pub fn fail(mut self, icao: &str, err: FetchError) -> Self {
        self.answers.insert(icao.into(), Err(err));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<(String, TimeWindow)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl RouteSource for ScriptedRoutes {
    async fn route_history(
        &self,
        icao24: &str,
        window: TimeWindow,
    ) -> Result<Vec<FlightRecord>, FetchError> {
        self.call_times.lock().unwrap().push(Instant::now());
        self.calls.lock().unwrap().push((icao24.to_string(), window));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answers
            .get(icao24)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ---------------------------------------------------------------------------
// Position sensor
// ---------------------------------------------------------------------------

pub struct FixedSensor {
    result: Result<Coordinate, SensorFailure>,
    delay: Duration,
    requests: Mutex<Vec<PositionRequest>>,
}

impl FixedSensor {
    pub fn at(lat: f64, lon: f64) -> Self {
        FixedSensor {
            result: Ok(Coordinate::new(lat, lon).unwrap()),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(failure: SensorFailure) -> Self {
        FixedSensor {
            result: Err(failure),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<PositionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PositionSensor for FixedSensor {
    async fn current_position(
        &self,
        request: &PositionRequest,
    ) -> Result<Coordinate, SensorFailure> {
        self.requests.lock().unwrap().push(*request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}
