//! Web server — axum REST API over the search orchestrator.
//!
//! Shared state is the orchestrator plus a single `SearchSession` that a
//! background task keeps in step with the event bus. A new search replaces
//! the previous session.

use std::sync::{Arc, PoisonError, RwLock};

use axum::Router;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, trace};

use flightfinder_core::{SearchSession, SessionEvent};

use crate::orchestrator::SearchOrchestrator;

pub mod routes;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub orchestrator: Arc<SearchOrchestrator>,
    pub session: Arc<RwLock<SearchSession>>,
}

impl AppState {
    pub fn new(orchestrator: Arc<SearchOrchestrator>) -> Self {
        let session = SearchSession::new(orchestrator.config().correlation);
        AppState {
            orchestrator,
            session: Arc::new(RwLock::new(session)),
        }
    }
}

/// Fold bus events into the shared session until the bus goes away.
pub fn spawn_session_feed(
    mut rx: UnboundedReceiver<SessionEvent>,
    session: Arc<RwLock<SearchSession>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let mut session = session.write().unwrap_or_else(PoisonError::into_inner);
            if !session.apply(&event) {
                trace!(generation = %event.generation, "event not applied");
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/search", axum::routing::post(routes::api_search))
        .route("/api/session", axum::routing::get(routes::api_session))
        .with_state(state)
        .layer(cors)
}

/// Start the web server.
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("flightfinder listening on http://{addr}");
    axum::serve(listener, app).await
}
