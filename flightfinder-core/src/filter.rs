//! Proximity filter: exact distance, radius cut and ranking.
//!
//! The primary query returns everything inside a rectangular box; this pass
//! keeps only aircraft within the true radius and orders them nearest first.

use crate::geo;
use crate::types::{AircraftState, Coordinate, RankedFlight};

/// Rank `flights` by distance from `center`, dropping any beyond `radius_miles`.
///
/// The boundary is inclusive. Equal distances keep their input order.
pub fn filter_nearby(
    flights: &[AircraftState],
    center: &Coordinate,
    radius_miles: f64,
) -> Vec<RankedFlight> {
    let mut ranked: Vec<RankedFlight> = flights
        .iter()
        .filter_map(|ac| {
            let d = geo::distance(center, &ac.coordinate);
            (d.miles <= radius_miles).then(|| RankedFlight::new(ac.clone(), d.km, d.miles))
        })
        .collect();

    ranked.sort_by(|a, b| a.distance_miles().total_cmp(&b.distance_miles()));
    ranked
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
