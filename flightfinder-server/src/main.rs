//! flightfinder: find airborne flights near you, from the terminal or over HTTP.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use flightfinder_core::config::{self, HomeConfig};
use flightfinder_core::{Config, Correlation, SessionEvent};

mod bus;
mod enrich;
mod opensky;
mod orchestrator;
mod render;
mod sensor;
mod source;
mod web;

#[cfg(test)]
mod testutil;

use bus::EventBus;
use opensky::OpenSkyClient;
use orchestrator::SearchOrchestrator;
use sensor::{IpGeolocationSensor, LocationProvider, LocationRequest, PositionSensor};
use source::FlightSource;

#[derive(Parser)]
#[command(
    name = "flightfinder",
    version,
    about = "Find airborne flights near a location"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search once and print the nearby flights, then their routes
    Search {
        #[command(flatten)]
        args: SearchArgs,
    },

    /// Serve the JSON search API
    Serve {
        #[command(flatten)]
        args: SearchArgs,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,
    },

    /// Show the effective configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,

        /// Config file path (default ~/.flightfinder/config.yaml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct SearchArgs {
    /// Latitude in decimal degrees; with --lon, skips geolocation
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<String>,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<String>,

    /// Search radius in miles
    #[arg(short, long)]
    radius: Option<f64>,

    /// Pause between route lookups, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Match route patches by `callsign` or `icao24`
    #[arg(long)]
    correlate: Option<Correlation>,

    /// Flight data service base URL
    #[arg(long, env = "FLIGHTFINDER_FLIGHT_API")]
    flight_api: Option<String>,

    /// IP geolocation service base URL
    #[arg(long, env = "FLIGHTFINDER_GEO_API")]
    geo_api: Option<String>,

    /// Config file path (default ~/.flightfinder/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Never ask the geolocation service for a position
    #[arg(long)]
    no_geolocate: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search { args } => cmd_search(args).await,
        Commands::Serve { args, host, port } => cmd_serve(args, &host, port).await,
        Commands::Config { init, config } => cmd_config(init, config.as_deref()),
    }
}

fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map(Path::to_path_buf).unwrap_or_else(config::config_file)
}

/// File values overridden by whatever was given on the command line.
fn effective_config(args: &SearchArgs) -> Config {
    let path = config_path(args.config.as_deref());
    let mut config = config::load_config(&path);
    debug!(path = %path.display(), "loaded config");

    if let Some(r) = args.radius.filter(|r| *r > 0.0) {
        config.search.radius_miles = r;
    }
    if let Some(ms) = args.delay_ms {
        config.search.enrichment_delay = Duration::from_millis(ms);
    }
    if let Some(c) = args.correlate {
        config.search.correlation = c;
    }
    if let Some(url) = &args.flight_api {
        config.api.flight_api = url.clone();
    }
    if let Some(url) = &args.geo_api {
        config.api.geolocation_api = url.clone();
    }
    config
}

/// Explicit coordinates win, then the configured home, then the sensor.
fn location_request(args: &SearchArgs, home: &HomeConfig) -> LocationRequest {
    if args.lat.is_some() || args.lon.is_some() {
        return LocationRequest::Manual {
            lat: args.lat.clone().unwrap_or_default(),
            lon: args.lon.clone().unwrap_or_default(),
        };
    }
    match (home.lat, home.lon) {
        (Some(lat), Some(lon)) => LocationRequest::Manual {
            lat: lat.to_string(),
            lon: lon.to_string(),
        },
        _ => LocationRequest::Device,
    }
}

fn build_orchestrator(
    config: &Config,
    geolocate: bool,
) -> (Arc<SearchOrchestrator>, UnboundedReceiver<SessionEvent>) {
    let search = config.search.clone();
    let sensor = geolocate.then(|| {
        Arc::new(IpGeolocationSensor::new(&config.api.geolocation_api)) as Arc<dyn PositionSensor>
    });
    let client = Arc::new(OpenSkyClient::new(&config.api.flight_api));
    let (bus, rx) = EventBus::new();

    let orchestrator = SearchOrchestrator::new(
        search.clone(),
        LocationProvider::new(sensor, search.location_timeout),
        FlightSource::new(client.clone(), search.fetch_timeout),
        client,
        bus,
    );
    (Arc::new(orchestrator), rx)
}

async fn cmd_search(args: SearchArgs) {
    let config = effective_config(&args);
    let request = location_request(&args, &config.home);
    let (orchestrator, rx) = build_orchestrator(&config, !args.no_geolocate);

    let printer = tokio::spawn(render::run(
        rx,
        render::ConsoleRenderer::new(config.search.correlation),
    ));

    let outcome = orchestrator.search(request).await;
    let session = printer.await;

    match outcome {
        Ok(outcome) => {
            if let Ok(report) = outcome.enrichment.await {
                info!(
                    patched = report.patched.len(),
                    skipped = report.skipped.len(),
                    "done"
                );
            }
            if let Ok(session) = session {
                debug!(flights = session.flights.len(), enriched = session.enriched_count());
            }
        }
        Err(_) => std::process::exit(1),
    }
}

async fn cmd_serve(args: SearchArgs, host: &str, port: u16) {
    let config = effective_config(&args);
    let (orchestrator, rx) = build_orchestrator(&config, !args.no_geolocate);

    let state = Arc::new(web::AppState::new(orchestrator));
    web::spawn_session_feed(rx, state.session.clone());

    if let Err(e) = web::serve(state, host, port).await {
        eprintln!("Error starting server on {host}:{port}: {e}");
        std::process::exit(1);
    }
}

fn cmd_config(init: bool, path: Option<&Path>) {
    let path = config_path(path);

    if init {
        if let Err(e) = config::save_config(&Config::default(), &path) {
            eprintln!("Error writing {}: {e}", path.display());
            std::process::exit(1);
        }
        println!("Wrote default configuration to {}", path.display());
        return;
    }

    println!("# {}", path.display());
    print!("{}", config::serialize_config(&config::load_config(&path)));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
