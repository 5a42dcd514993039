//! EnrichmentPipeline — background route lookups for displayed results.
//!
//! Walks the ranked list strictly in order, one request at a time, sleeping
//! a fixed delay after every attempt to stay under the route service's rate
//! limit. A failed or empty lookup leaves that flight unrouted and moves on;
//! nothing is retried. Each patch is published only while the session that
//! spawned the pipeline is still current.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use flightfinder_core::routes::{self, TimeWindow};
use flightfinder_core::{
    EnrichmentItemError, EnrichmentState, EventKind, Generation, RankedFlight, RoutePatch,
    SearchConfig, SearchStatus,
};

use crate::bus::EventBus;
use crate::source::RouteSource;

/// What one pipeline run did.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentReport {
    pub generation: Generation,
    pub state: EnrichmentState,
    pub patched: Vec<String>,
    pub skipped: Vec<EnrichmentItemError>,
}

#[derive(Clone)]
pub struct EnrichmentPipeline {
    routes: Arc<dyn RouteSource>,
    delay: Duration,
    window: Duration,
}

impl EnrichmentPipeline {
    pub fn new(routes: Arc<dyn RouteSource>, config: &SearchConfig) -> Self {
        EnrichmentPipeline {
            routes,
            delay: config.enrichment_delay,
            window: config.route_window,
        }
    }

    /// Run detached; the caller gets control back immediately.
    pub fn spawn(
        &self,
        flights: Vec<RankedFlight>,
        generation: Generation,
        bus: Arc<EventBus>,
    ) -> JoinHandle<EnrichmentReport> {
        let pipeline = self.clone();
        tokio::spawn(async move { pipeline.run(&flights, generation, &bus).await })
    }

    pub async fn run(
        &self,
        flights: &[RankedFlight],
        generation: Generation,
        bus: &EventBus,
    ) -> EnrichmentReport {
        let mut report = EnrichmentReport {
            generation,
            state: EnrichmentState::Running,
            patched: Vec::new(),
            skipped: Vec::new(),
        };
        debug!(%generation, count = flights.len(), "route enrichment started");

        for flight in flights {
            if !bus.is_current(generation) {
                return cancelled(report);
            }

            let window = TimeWindow::trailing(chrono::Utc::now().timestamp(), self.window);
            match self.routes.route_history(flight.icao24(), window).await {
                Ok(records) => match routes::latest_route(&records) {
                    Some(route) => {
                        let patch = RoutePatch {
                            icao24: flight.icao24().to_string(),
                            callsign: flight.callsign().to_string(),
                            route,
                        };
                        if !bus.publish(generation, EventKind::Patch(patch)) {
                            return cancelled(report);
                        }
                        report.patched.push(flight.icao24().to_string());
                    }
                    None => {
                        debug!(icao24 = flight.icao24(), "no route history");
                        report.skipped.push(EnrichmentItemError::NoRecords {
                            icao24: flight.icao24().to_string(),
                        });
                    }
                },
                Err(e) => {
                    debug!(icao24 = flight.icao24(), callsign = flight.callsign(), error = %e,
                        "could not fetch route");
                    report.skipped.push(EnrichmentItemError::Fetch {
                        icao24: flight.icao24().to_string(),
                        source: e,
                    });
                }
            }

            tokio::time::sleep(self.delay).await;
        }

        report.state = EnrichmentState::Completed;
        info!(
            %generation,
            patched = report.patched.len(),
            skipped = report.skipped.len(),
            "route enrichment finished"
        );
        bus.publish(
            generation,
            EventKind::EnrichmentFinished {
                state: report.state,
                patched: report.patched.len(),
                skipped: report.skipped.len(),
            },
        );
        bus.publish(
            generation,
            EventKind::Status {
                status: SearchStatus::Idle,
            },
        );
        report
    }
}

fn cancelled(mut report: EnrichmentReport) -> EnrichmentReport {
    info!(generation = %report.generation, patched = report.patched.len(),
        "route enrichment cancelled by newer search");
    report.state = EnrichmentState::Cancelled;
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
