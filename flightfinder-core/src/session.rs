//! Search session state and the events that drive it.
//!
//! The orchestrator publishes `SessionEvent`s tagged with a `Generation`.
//! Rendering collaborators fold them into a `SearchSession`, which drops
//! anything from a superseded generation so a late patch from an old search
//! can never touch the list on screen.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::types::{Coordinate, RankedFlight, Route};

/// Monotonically increasing search epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Generation {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stage of a search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchStatus {
    Idle,
    LocatingUser,
    FetchingFlights,
    Filtering,
    Displaying,
    EnrichingRoutes,
    Error,
}

impl SearchStatus {
    /// Status-line text for a stage that has just started.
    pub fn message(self) -> &'static str {
        match self {
            SearchStatus::Idle => "",
            SearchStatus::LocatingUser => "Getting your location...",
            SearchStatus::FetchingFlights => "Fetching flight data...",
            SearchStatus::Filtering => "Calculating distances...",
            SearchStatus::Displaying => "Displaying results...",
            SearchStatus::EnrichingRoutes => "Looking up routes...",
            SearchStatus::Error => "",
        }
    }
}

/// Lifecycle of one session's enrichment pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnrichmentState {
    NotStarted,
    Running,
    Completed,
    Cancelled,
}

/// Which rendered records an enrichment patch applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Correlation {
    /// Every record whose callsign matches. Duplicate callsigns (including
    /// the `Unknown` sentinel) all receive the same route.
    #[default]
    Callsign,
    /// Only the record with the matching transponder address.
    Icao24,
}

impl FromStr for Correlation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "callsign" => Ok(Correlation::Callsign),
            "icao24" | "id" => Ok(Correlation::Icao24),
            other => Err(format!("unknown correlation strategy: {other}")),
        }
    }
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Correlation::Callsign => write!(f, "callsign"),
            Correlation::Icao24 => write!(f, "icao24"),
        }
    }
}

/// Enrichment result for one already-rendered record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePatch {
    pub icao24: String,
    pub callsign: String,
    pub route: Route,
}

impl RoutePatch {
    pub fn matches(&self, flight: &RankedFlight, correlation: Correlation) -> bool {
        match correlation {
            Correlation::Callsign => flight.callsign() == self.callsign,
            Correlation::Icao24 => flight.icao24() == self.icao24,
        }
    }
}

/// Payload of a session event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Status {
        status: SearchStatus,
    },
    /// Full ordered list for initial render.
    Results {
        center: Coordinate,
        radius_miles: f64,
        flights: Vec<RankedFlight>,
    },
    Patch(RoutePatch),
    /// Terminal failure of a blocking stage.
    Error {
        message: String,
    },
    EnrichmentFinished {
        state: EnrichmentState,
        patched: usize,
        skipped: usize,
    },
}

/// An event from one search generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEvent {
    pub generation: Generation,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Collaborator-side state of the current search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSession {
    pub generation: Generation,
    pub status: SearchStatus,
    pub center: Option<Coordinate>,
    pub radius_miles: Option<f64>,
    pub flights: Vec<RankedFlight>,
    pub enrichment: EnrichmentState,
    pub error: Option<String>,
    /// Seconds since the Unix epoch of the last results or patch.
    pub last_update: Option<i64>,
    #[serde(skip)]
    correlation: Correlation,
}

impl SearchSession {
    pub fn new(correlation: Correlation) -> Self {
        SearchSession {
            generation: Generation::default(),
            status: SearchStatus::Idle,
            center: None,
            radius_miles: None,
            flights: Vec::new(),
            enrichment: EnrichmentState::NotStarted,
            error: None,
            last_update: None,
            correlation,
        }
    }

    pub fn correlation(&self) -> Correlation {
        self.correlation
    }

    /// Fold one event into the session. Returns false when it was ignored.
    pub fn apply(&mut self, event: &SessionEvent) -> bool {
        if event.generation < self.generation {
            return false;
        }
        if event.generation > self.generation {
            self.reset(event.generation);
        }

        match &event.kind {
            EventKind::Status { status } => {
                self.status = *status;
                if *status == SearchStatus::EnrichingRoutes {
                    self.enrichment = EnrichmentState::Running;
                }
            }
            EventKind::Results {
                center,
                radius_miles,
                flights,
            } => {
                self.center = Some(*center);
                self.radius_miles = Some(*radius_miles);
                self.flights = flights.clone();
                self.touch();
            }
            EventKind::Patch(patch) => {
                let correlation = self.correlation;
                let mut hit = false;
                for flight in self
                    .flights
                    .iter_mut()
                    .filter(|f| patch.matches(f, correlation))
                {
                    flight.route = Some(patch.route.clone());
                    hit = true;
                }
                if !hit {
                    return false;
                }
                self.touch();
            }
            EventKind::Error { message } => {
                self.status = SearchStatus::Error;
                self.error = Some(message.clone());
            }
            EventKind::EnrichmentFinished { state, .. } => {
                self.enrichment = *state;
            }
        }
        true
    }

    /// Number of records with a route attached.
    pub fn enriched_count(&self) -> usize {
        self.flights.iter().filter(|f| f.route.is_some()).count()
    }

    /// "Found N flights within R miles" once results are in.
    pub fn summary(&self) -> Option<String> {
        let radius = self.radius_miles?;
        Some(format!(
            "Found {} flights within {} miles",
            self.flights.len(),
            radius
        ))
    }

    fn reset(&mut self, generation: Generation) {
        *self = SearchSession {
            generation,
            ..SearchSession::new(self.correlation)
        };
    }

    fn touch(&mut self) {
        self.last_update = Some(chrono::Utc::now().timestamp());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AircraftState;

    fn flight(icao: &str, callsign: &str, miles: f64) -> RankedFlight {
        RankedFlight::new(
            AircraftState {
                icao24: icao.into(),
                callsign: callsign.into(),
                origin_country: "Germany".into(),
                coordinate: Coordinate::new(50.0, 8.5).unwrap(),
                altitude_m: None,
                ground_speed_mps: None,
                heading_deg: None,
                vertical_rate_mps: None,
                on_ground: false,
            },
            miles * 1.60934,
            miles,
        )
    }

    fn results(gen: u64, flights: Vec<RankedFlight>) -> SessionEvent {
        SessionEvent {
            generation: Generation(gen),
            kind: EventKind::Results {
                center: Coordinate::new(50.0, 8.5).unwrap(),
                radius_miles: 100.0,
                flights,
            },
        }
    }

    fn patch(gen: u64, icao: &str, callsign: &str, origin: &str) -> SessionEvent {
        SessionEvent {
            generation: Generation(gen),
            kind: EventKind::Patch(RoutePatch {
                icao24: icao.into(),
                callsign: callsign.into(),
                route: Route {
                    origin: origin.into(),
                    destination: "EDDM".into(),
                },
            }),
        }
    }

    #[test]
    fn test_patch_in_place_keeps_order() {
        let mut s = SearchSession::new(Correlation::Callsign);
        s.apply(&results(
            1,
            vec![flight("a", "DLH1", 5.0), flight("b", "DLH2", 9.0)],
        ));
        assert!(s.apply(&patch(1, "b", "DLH2", "EDDF")));
        assert_eq!(s.flights[0].icao24(), "a");
        assert!(s.flights[0].route.is_none());
        assert_eq!(s.flights[1].route.as_ref().unwrap().origin, "EDDF");
        assert_eq!(s.enriched_count(), 1);
    }

    #[test]
    fn test_stale_generation_ignored() {
        let mut s = SearchSession::new(Correlation::Callsign);
        s.apply(&results(2, vec![flight("a", "DLH1", 5.0)]));
        assert!(!s.apply(&patch(1, "a", "DLH1", "EDDF")));
        assert!(s.flights[0].route.is_none());
    }

    #[test]
    fn test_newer_generation_resets() {
        let mut s = SearchSession::new(Correlation::Callsign);
        s.apply(&results(1, vec![flight("a", "DLH1", 5.0)]));
        s.apply(&SessionEvent {
            generation: Generation(2),
            kind: EventKind::Status {
                status: SearchStatus::LocatingUser,
            },
        });
        assert_eq!(s.generation, Generation(2));
        assert!(s.flights.is_empty());
        assert_eq!(s.status, SearchStatus::LocatingUser);
    }

    #[test]
    fn test_callsign_correlation_patches_duplicates() {
        let mut s = SearchSession::new(Correlation::Callsign);
        s.apply(&results(
            1,
            vec![flight("a", "Unknown", 5.0), flight("b", "Unknown", 9.0)],
        ));
        s.apply(&patch(1, "a", "Unknown", "EDDF"));
        assert_eq!(s.enriched_count(), 2);
    }

    #[test]
    fn test_icao24_correlation_patches_one() {
        let mut s = SearchSession::new(Correlation::Icao24);
        s.apply(&results(
            1,
            vec![flight("a", "Unknown", 5.0), flight("b", "Unknown", 9.0)],
        ));
        s.apply(&patch(1, "a", "Unknown", "EDDF"));
        assert_eq!(s.enriched_count(), 1);
        assert!(s.flights[1].route.is_none());
    }

    #[test]
    fn test_patch_without_match_is_ignored() {
        let mut s = SearchSession::new(Correlation::Icao24);
        s.apply(&results(1, vec![flight("a", "DLH1", 5.0)]));
        assert!(!s.apply(&patch(1, "zzz", "DLH1", "EDDF")));
    }

    #[test]
    fn test_error_event() {
        let mut s = SearchSession::new(Correlation::Callsign);
        s.apply(&SessionEvent {
            generation: Generation(1),
            kind: EventKind::Error {
                message: "boom".into(),
            },
        });
        assert_eq!(s.status, SearchStatus::Error);
        assert_eq!(s.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_enrichment_state_tracking() {
        let mut s = SearchSession::new(Correlation::Callsign);
        s.apply(&SessionEvent {
            generation: Generation(1),
            kind: EventKind::Status {
                status: SearchStatus::EnrichingRoutes,
            },
        });
        assert_eq!(s.enrichment, EnrichmentState::Running);
        s.apply(&SessionEvent {
            generation: Generation(1),
            kind: EventKind::EnrichmentFinished {
                state: EnrichmentState::Completed,
                patched: 0,
                skipped: 0,
            },
        });
        assert_eq!(s.enrichment, EnrichmentState::Completed);
    }

    #[test]
    fn test_summary() {
        let mut s = SearchSession::new(Correlation::Callsign);
        assert!(s.summary().is_none());
        s.apply(&results(1, vec![flight("a", "DLH1", 5.0)]));
        assert_eq!(s.summary().unwrap(), "Found 1 flights within 100 miles");
    }

    #[test]
    fn test_correlation_from_str() {
        assert_eq!("callsign".parse::<Correlation>(), Ok(Correlation::Callsign));
        assert_eq!("ICAO24".parse::<Correlation>(), Ok(Correlation::Icao24));
        assert!("tail".parse::<Correlation>().is_err());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let ev = SessionEvent {
            generation: Generation(3),
            kind: EventKind::Status {
                status: SearchStatus::Filtering,
            },
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["type"], "status");
        assert_eq!(v["generation"], 3);
        assert_eq!(v["status"], "Filtering");
    }
}
