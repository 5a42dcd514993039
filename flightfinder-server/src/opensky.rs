//! OpenSky Network REST client.
//!
//! Serves both data sources: `/states/all` for the live picture inside a
//! bounding box and `/flights/aircraft` for per-aircraft route history.

use async_trait::async_trait;
use tracing::debug;

use flightfinder_core::geo::BoundingBox;
use flightfinder_core::routes::{self, FlightRecord, TimeWindow};
use flightfinder_core::states::StatesResponse;
use flightfinder_core::FetchError;

use crate::source::{RouteSource, StateSource};

#[derive(Clone)]
pub struct OpenSkyClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenSkyClient {
    pub fn new(base_url: &str) -> Self {
        OpenSkyClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// GET `path` and return the body of a 2xx response.
    async fn get_text<Q: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "request rejected");
            return Err(FetchError::HttpStatus {
                code: status.as_u16(),
            });
        }

        resp.text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

#[async_trait]
impl StateSource for OpenSkyClient {
    async fn states_in(&self, bbox: &BoundingBox) -> Result<StatesResponse, FetchError> {
        let body = self
            .get_text(
                "/states/all",
                &[
                    ("lamin", bbox.min_lat),
                    ("lomin", bbox.min_lon),
                    ("lamax", bbox.max_lat),
                    ("lomax", bbox.max_lon),
                ],
            )
            .await?;
        serde_json::from_str(&body).map_err(|e| FetchError::ParseFailure(e.to_string()))
    }
}

#[async_trait]
impl RouteSource for OpenSkyClient {
    async fn route_history(
        &self,
        icao24: &str,
        window: TimeWindow,
    ) -> Result<Vec<FlightRecord>, FetchError> {
        let begin = window.begin.to_string();
        let end = window.end.to_string();
        let body = self
            .get_text(
                "/flights/aircraft",
                &[
                    ("icao24", icao24),
                    ("begin", begin.as_str()),
                    ("end", end.as_str()),
                ],
            )
            .await?;
        routes::parse_records(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
