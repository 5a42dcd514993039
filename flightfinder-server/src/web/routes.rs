//! REST API route handlers.
//!
//! `POST /api/search` runs the blocking stages and answers with the ranked
//! list; routes arrive later and show up in `GET /api/session`.

use std::sync::{Arc, PoisonError};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use flightfinder_core::{LocationError, SearchError};

use crate::sensor::LocationRequest;
use crate::web::AppState;

// ---------------------------------------------------------------------------
// Body types
// ---------------------------------------------------------------------------

/// Form fields arrive as text; API clients may send numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum CoordField {
    Number(f64),
    Text(String),
}

impl CoordField {
    fn into_text(self) -> String {
        match self {
            CoordField::Number(n) => n.to_string(),
            CoordField::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
struct SearchBody {
    lat: Option<CoordField>,
    lon: Option<CoordField>,
}

/// An empty body, or one without coordinates, asks for the device position.
fn location_request(body: &[u8]) -> Result<LocationRequest, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(LocationRequest::Device);
    }
    let body: SearchBody = serde_json::from_slice(body)?;
    Ok(match (body.lat, body.lon) {
        (None, None) => LocationRequest::Device,
        (lat, lon) => LocationRequest::Manual {
            lat: lat.map(CoordField::into_text).unwrap_or_default(),
            lon: lon.map(CoordField::into_text).unwrap_or_default(),
        },
    })
}

fn error_status(err: &SearchError) -> StatusCode {
    match err {
        SearchError::Location(LocationError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
        SearchError::Location(_) => StatusCode::SERVICE_UNAVAILABLE,
        SearchError::Fetch(_) => StatusCode::BAD_GATEWAY,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/search — start a session and return the ranked flights.
pub async fn api_search(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    let request = match location_request(&body) {
        Ok(r) => r,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": format!("invalid request body: {e}")})),
            )
        }
    };

    match state.orchestrator.search(request).await {
        Ok(outcome) => {
            let radius = state.orchestrator.config().radius_miles;
            (
                StatusCode::OK,
                Json(json!({
                    "generation": outcome.generation,
                    "center": outcome.center,
                    "radius_miles": radius,
                    "count": outcome.flights.len(),
                    "flights": outcome.flights,
                })),
            )
        }
        Err(e) => (error_status(&e), Json(json!({"error": e.to_string()}))),
    }
}

/// GET /api/session — current session snapshot, routes included.
pub async fn api_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.session.read().unwrap_or_else(PoisonError::into_inner);
    Json(serde_json::to_value(&*session).unwrap_or(Value::Null))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use flightfinder_core::{FetchError, SearchConfig};

    use crate::bus::EventBus;
    use crate::orchestrator::SearchOrchestrator;
    use crate::sensor::LocationProvider;
    use crate::source::FlightSource;
    use crate::testutil::{state_row, ScriptedRoutes, ScriptedStates};
    use crate::web::{build_router, spawn_session_feed};

    fn test_state(states: ScriptedStates, routes: ScriptedRoutes) -> Arc<AppState> {
        let config = SearchConfig {
            enrichment_delay: Duration::from_millis(1),
            ..SearchConfig::default()
        };
        let (bus, rx) = EventBus::new();
        let orchestrator = SearchOrchestrator::new(
            config.clone(),
            LocationProvider::new(None, config.location_timeout),
            FlightSource::new(Arc::new(states), config.fetch_timeout),
            Arc::new(routes),
            bus,
        );
        let state = Arc::new(AppState::new(Arc::new(orchestrator)));
        spawn_session_feed(rx, state.session.clone());
        state
    }

    fn sample_states() -> ScriptedStates {
        ScriptedStates::rows(vec![
            state_row("a1b2c3", "DAL12 ", Some(40.0), Some(-75.0), false),
            state_row("d4e5f6", "", Some(40.05), Some(-74.0), false),
            state_row("0a0b0c", "FAR", Some(41.5), Some(-74.0), false),
        ])
    }

    fn post_search(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/search")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_location_request_parsing() {
        assert_eq!(location_request(b"").unwrap(), LocationRequest::Device);
        assert_eq!(location_request(b"{}").unwrap(), LocationRequest::Device);
        assert_eq!(
            location_request(br#"{"lat": 45.5, "lon": "-93"}"#).unwrap(),
            LocationRequest::Manual {
                lat: "45.5".into(),
                lon: "-93".into()
            }
        );
        assert_eq!(
            location_request(br#"{"lat": "12"}"#).unwrap(),
            LocationRequest::Manual {
                lat: "12".into(),
                lon: "".into()
            }
        );
        assert!(location_request(b"lat=1").is_err());
    }

    #[tokio::test]
    async fn test_api_search_manual() {
        let state = test_state(sample_states(), ScriptedRoutes::new());
        let app = build_router(state);

        let response = app
            .oneshot(post_search(r#"{"lat": "40.0", "lon": "-74.0"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 2);
        assert_eq!(json["radius_miles"], 100.0);
        let flights = json["flights"].as_array().unwrap();
        assert_eq!(flights[0]["icao24"], "d4e5f6");
        assert_eq!(flights[0]["callsign"], "Unknown");
        assert_eq!(flights[1]["callsign"], "DAL12");
        assert!(flights[1]["route"].is_null());
    }

    #[tokio::test]
    async fn test_api_search_invalid_coordinates() {
        let state = test_state(sample_states(), ScriptedRoutes::new());
        let app = build_router(state);

        let response = app
            .oneshot(post_search(r#"{"lat": 91, "lon": 0}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Latitude must be between -90 and 90.");
    }

    #[tokio::test]
    async fn test_api_search_not_a_number() {
        let state = test_state(sample_states(), ScriptedRoutes::new());
        let app = build_router(state);
        let response = app
            .oneshot(post_search(r#"{"lat": "abc", "lon": "0"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Please enter valid latitude and longitude values.");
    }

    #[tokio::test]
    async fn test_api_search_without_sensor() {
        let state = test_state(sample_states(), ScriptedRoutes::new());
        let app = build_router(state);
        let response = app.oneshot(post_search("")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_api_search_upstream_failure() {
        let state = test_state(
            ScriptedStates::failing(FetchError::HttpStatus { code: 429 }),
            ScriptedRoutes::new(),
        );
        let app = build_router(state);
        let response = app
            .oneshot(post_search(r#"{"lat": 40, "lon": -74}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Failed to fetch flight data: HTTP 429");
    }

    #[tokio::test]
    async fn test_api_session_shows_routes() {
        let state = test_state(
            sample_states(),
            ScriptedRoutes::new().route("a1b2c3", "KATL", "KCLT"),
        );
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(post_search(r#"{"lat": 40, "lon": -74}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut snapshot = Value::Null;
        for _ in 0..100 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/api/session")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            snapshot = body_json(response).await;
            if snapshot["enrichment"] == "Completed" && snapshot["status"] == "Idle" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(snapshot["enrichment"], "Completed");
        assert_eq!(snapshot["status"], "Idle");
        let flights = snapshot["flights"].as_array().unwrap();
        assert_eq!(flights.len(), 2);
        assert!(flights[0]["route"].is_null());
        assert_eq!(flights[1]["route"]["origin"], "KATL");
        assert_eq!(flights[1]["route"]["destination"], "KCLT");
    }
}
