//! SearchOrchestrator — runs one search session end to end.
//!
//! Blocking stages run in order on the caller's task:
//! `LocatingUser → FetchingFlights → Filtering → Displaying`. Route
//! enrichment is then spawned detached and the caller gets the ranked list
//! back straight away. Every stage change is published on the event bus
//! tagged with the session's generation.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use flightfinder_core::{
    filter_nearby, Coordinate, EventKind, Generation, RankedFlight, SearchConfig, SearchError,
    SearchStatus,
};

use crate::bus::EventBus;
use crate::enrich::{EnrichmentPipeline, EnrichmentReport};
use crate::sensor::{LocationProvider, LocationRequest};
use crate::source::{FlightSource, RouteSource};

/// What a successful search hands back to its caller.
#[derive(Debug)]
pub struct SearchOutcome {
    pub generation: Generation,
    pub center: Coordinate,
    pub flights: Vec<RankedFlight>,
    pub enrichment: JoinHandle<EnrichmentReport>,
}

pub struct SearchOrchestrator {
    config: SearchConfig,
    location: LocationProvider,
    flights: FlightSource,
    enrichment: EnrichmentPipeline,
    bus: Arc<EventBus>,
}

impl SearchOrchestrator {
    pub fn new(
        config: SearchConfig,
        location: LocationProvider,
        flights: FlightSource,
        routes: Arc<dyn RouteSource>,
        bus: Arc<EventBus>,
    ) -> Self {
        let enrichment = EnrichmentPipeline::new(routes, &config);
        SearchOrchestrator {
            config,
            location,
            flights,
            enrichment,
            bus,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Start a new session, superseding any earlier one.
    pub async fn search(&self, request: LocationRequest) -> Result<SearchOutcome, SearchError> {
        let generation = self.bus.begin();
        info!(%generation, radius_miles = self.config.radius_miles, "search started");

        match self.run_blocking(generation, &request).await {
            Ok((center, flights)) => {
                self.stage(generation, SearchStatus::EnrichingRoutes);
                let enrichment =
                    self.enrichment
                        .spawn(flights.clone(), generation, Arc::clone(&self.bus));
                Ok(SearchOutcome {
                    generation,
                    center,
                    flights,
                    enrichment,
                })
            }
            Err(e) => {
                warn!(%generation, error = %e, "search failed");
                self.stage(generation, SearchStatus::Error);
                self.bus.publish(
                    generation,
                    EventKind::Error {
                        message: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }

    async fn run_blocking(
        &self,
        generation: Generation,
        request: &LocationRequest,
    ) -> Result<(Coordinate, Vec<RankedFlight>), SearchError> {
        self.stage(generation, SearchStatus::LocatingUser);
        let center = self.location.locate(request).await?;

        self.stage(generation, SearchStatus::FetchingFlights);
        let aircraft = self.flights.fetch(&center, self.config.radius_miles).await?;

        self.stage(generation, SearchStatus::Filtering);
        let ranked = filter_nearby(&aircraft, &center, self.config.radius_miles);
        info!(
            %generation,
            %center,
            airborne = aircraft.len(),
            nearby = ranked.len(),
            "ranked nearby flights"
        );

        self.stage(generation, SearchStatus::Displaying);
        self.bus.publish(
            generation,
            EventKind::Results {
                center,
                radius_miles: self.config.radius_miles,
                flights: ranked.clone(),
            },
        );
        Ok((center, ranked))
    }

    fn stage(&self, generation: Generation, status: SearchStatus) {
        self.bus.publish(generation, EventKind::Status { status });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
