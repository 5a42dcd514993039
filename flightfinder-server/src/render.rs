//! Terminal renderer for `flightfinder search`.
//!
//! Folds session events into a `SearchSession` and turns each accepted event
//! into the text to print: status lines, the ranked table, one line per
//! route patch, and the final table once enrichment has finished.

use chrono::{DateTime, Local};
use comfy_table::{Cell, CellAlignment, Table};
use tokio::sync::mpsc::UnboundedReceiver;

use flightfinder_core::{
    Correlation, EnrichmentState, EventKind, RankedFlight, SearchSession, SearchStatus,
    SessionEvent,
};

const NOT_AVAILABLE: &str = "N/A";

pub struct ConsoleRenderer {
    session: SearchSession,
}

impl ConsoleRenderer {
    pub fn new(correlation: Correlation) -> Self {
        ConsoleRenderer {
            session: SearchSession::new(correlation),
        }
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn into_session(self) -> SearchSession {
        self.session
    }

    /// Apply `event` and return what to print, if anything.
    pub fn handle(&mut self, event: &SessionEvent) -> Option<String> {
        if !self.session.apply(event) {
            return None;
        }

        match &event.kind {
            EventKind::Status { status } => {
                let message = status.message();
                (!message.is_empty()).then(|| message.to_string())
            }
            EventKind::Results {
                center,
                radius_miles,
                flights,
            } => {
                if flights.is_empty() {
                    return Some(format!(
                        "No flights found\nThere are no flights within {radius_miles} miles \
                         of {center} at this time.\nTry again in a few moments as flight \
                         data updates regularly."
                    ));
                }
                let mut out = self.header();
                out.push('\n');
                out.push_str(&flight_table(flights).to_string());
                Some(out)
            }
            EventKind::Patch(patch) => Some(format!(
                "  {:<8} {:<6} {}",
                patch.callsign, patch.icao24, patch.route
            )),
            EventKind::Error { message } => Some(format!("Error: {message}")),
            EventKind::EnrichmentFinished { state, patched, .. } => {
                if *state != EnrichmentState::Completed || self.session.flights.is_empty() {
                    return None;
                }
                Some(format!(
                    "\nRoutes found for {patched} of {} flights\n{}",
                    self.session.flights.len(),
                    flight_table(&self.session.flights)
                ))
            }
        }
    }

    fn header(&self) -> String {
        let mut out = self.session.summary().unwrap_or_default();
        if let Some(center) = self.session.center {
            out.push_str(&format!(
                "\nYour location: {:.4}, {:.4}",
                center.latitude(),
                center.longitude()
            ));
        }
        if let Some(ts) = self.session.last_update {
            out.push_str(&format!("\nLast update: {}", clock_local(ts)));
        }
        out
    }
}

/// Wall-clock `HH:MM:SS` in the local timezone for a Unix timestamp.
fn clock_local(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.into())
}

fn or_na<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| NOT_AVAILABLE.into())
}

pub fn flight_table(flights: &[RankedFlight]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Callsign", "ICAO24", "Country", "Alt (ft)", "Speed (mph)", "Hdg", "Vertical",
        "Distance (mi)", "Route",
    ]);

    for f in flights {
        let ac = &f.state;
        table.add_row(vec![
            Cell::new(&ac.callsign),
            Cell::new(&ac.icao24),
            Cell::new(&ac.origin_country),
            Cell::new(or_na(ac.altitude_ft())).set_alignment(CellAlignment::Right),
            Cell::new(or_na(ac.speed_mph())).set_alignment(CellAlignment::Right),
            Cell::new(
                ac.heading_rounded()
                    .map(|h| format!("{h}°"))
                    .unwrap_or_else(|| NOT_AVAILABLE.into()),
            ),
            Cell::new(ac.vertical_trend()),
            Cell::new(format!("{:.1}", f.distance_miles())).set_alignment(CellAlignment::Right),
            Cell::new(f.route_text()),
        ]);
    }

    table
}

/// Print events until the session settles, then return its final state.
pub async fn run(
    mut rx: UnboundedReceiver<SessionEvent>,
    mut renderer: ConsoleRenderer,
) -> SearchSession {
    while let Some(event) = rx.recv().await {
        let settled = matches!(
            event.kind,
            EventKind::Error { .. }
                | EventKind::Status {
                    status: SearchStatus::Idle
                }
        );
        if let Some(text) = renderer.handle(&event) {
            match event.kind {
                EventKind::Error { .. } => eprintln!("{text}"),
                _ => println!("{text}"),
            }
        }
        if settled && event.generation == renderer.session().generation {
            break;
        }
    }
    renderer.into_session()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
