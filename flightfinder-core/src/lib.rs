//! flightfinder-core: Pure search logic for nearby airborne aircraft.
//!
//! No async and no network: geodesy, response normalization, ranking, the
//! session state machine and the config file. The `flightfinder` binary
//! crate supplies the network clients, the background enrichment task and
//! the user surfaces.

pub mod config;
pub mod filter;
pub mod geo;
pub mod location;
pub mod routes;
pub mod session;
pub mod states;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{Config, SearchConfig};
pub use filter::filter_nearby;
pub use session::{
    Correlation, EnrichmentState, EventKind, Generation, RoutePatch, SearchSession, SearchStatus,
    SessionEvent,
};
pub use types::*;
