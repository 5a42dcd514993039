//! Configuration for flightfinder.
//!
//! `SearchConfig` is the immutable record handed to every pipeline stage.
//! It can be seeded from `~/.flightfinder/config.yaml` (search tuning, API
//! endpoints, and a default home location) and then overridden from the CLI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::session::Correlation;
use crate::types::ConfigError;

pub const DEFAULT_RADIUS_MILES: f64 = 100.0;
pub const DEFAULT_ENRICHMENT_DELAY_MS: u64 = 100;
pub const DEFAULT_ROUTE_WINDOW_SECS: u64 = 86_400;
pub const DEFAULT_LOCATION_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

pub const DEFAULT_FLIGHT_API: &str = "https://opensky-network.org/api";
pub const DEFAULT_GEOLOCATION_API: &str = "http://ip-api.com";

/// Search parameters shared by every stage of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub radius_miles: f64,
    /// Pause after each route lookup, successful or not.
    pub enrichment_delay: Duration,
    /// Span of route history requested, ending now.
    pub route_window: Duration,
    pub location_timeout: Duration,
    pub fetch_timeout: Duration,
    pub correlation: Correlation,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            radius_miles: DEFAULT_RADIUS_MILES,
            enrichment_delay: Duration::from_millis(DEFAULT_ENRICHMENT_DELAY_MS),
            route_window: Duration::from_secs(DEFAULT_ROUTE_WINDOW_SECS),
            location_timeout: Duration::from_secs(DEFAULT_LOCATION_TIMEOUT_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            correlation: Correlation::Callsign,
        }
    }
}

/// Remote service endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub flight_api: String,
    pub geolocation_api: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            flight_api: DEFAULT_FLIGHT_API.into(),
            geolocation_api: DEFAULT_GEOLOCATION_API.into(),
        }
    }
}

/// Default location used when no coordinates are given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeConfig {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Full configuration structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub search: SearchConfig,
    pub api: ApiConfig,
    pub home: HomeConfig,
}

/// Get the config directory path (`~/.flightfinder/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".flightfinder")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `path`.
///
/// Returns the default config if the file doesn't exist or can't be read.
pub fn load_config(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_config(&text),
        Err(_) => Config::default(),
    }
}

/// Write `config` to `path`, creating parent directories.
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, serialize_config(config))?;
    Ok(())
}

/// Parse simple YAML-like config text. Unknown keys and bad values are skipped.
pub fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            current_section = val.is_empty().then(|| key.to_string());
            continue;
        }

        match current_section.as_deref() {
            Some("search") => apply_search_key(&mut config.search, key, val),
            Some("api") => match key {
                "flight_api" => {
                    if let Some(v) = parse_string_value(val) {
                        config.api.flight_api = v;
                    }
                }
                "geolocation_api" => {
                    if let Some(v) = parse_string_value(val) {
                        config.api.geolocation_api = v;
                    }
                }
                _ => {}
            },
            Some("home") => match key {
                "lat" => config.home.lat = parse_float_value(val),
                "lon" => config.home.lon = parse_float_value(val),
                _ => {}
            },
            _ => {}
        }
    }

    config
}

fn apply_search_key(search: &mut SearchConfig, key: &str, val: &str) {
    match key {
        "radius_miles" => {
            if let Some(v) = parse_float_value(val).filter(|r| *r > 0.0) {
                search.radius_miles = v;
            }
        }
        "enrichment_delay_ms" => {
            if let Ok(v) = val.parse::<u64>() {
                search.enrichment_delay = Duration::from_millis(v);
            }
        }
        "route_window_secs" => {
            if let Ok(v) = val.parse::<u64>() {
                search.route_window = Duration::from_secs(v);
            }
        }
        "location_timeout_secs" => {
            if let Ok(v) = val.parse::<u64>() {
                search.location_timeout = Duration::from_secs(v);
            }
        }
        "fetch_timeout_secs" => {
            if let Ok(v) = val.parse::<u64>() {
                search.fetch_timeout = Duration::from_secs(v);
            }
        }
        "correlation" => {
            if let Some(v) = parse_string_value(val).and_then(|s| s.parse().ok()) {
                search.correlation = v;
            }
        }
        _ => {}
    }
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    if (val.starts_with('"') && val.ends_with('"') && val.len() >= 2)
        || (val.starts_with('\'') && val.ends_with('\'') && val.len() >= 2)
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn parse_float_value(val: &str) -> Option<f64> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    val.parse().ok()
}

/// Serialize config to YAML-like text.
pub fn serialize_config(config: &Config) -> String {
    let s = &config.search;
    let mut lines = vec!["# flightfinder configuration".to_string(), String::new()];

    lines.push("search:".into());
    lines.push(format!("  radius_miles: {}", s.radius_miles));
    lines.push(format!(
        "  enrichment_delay_ms: {}",
        s.enrichment_delay.as_millis()
    ));
    lines.push(format!("  route_window_secs: {}", s.route_window.as_secs()));
    lines.push(format!(
        "  location_timeout_secs: {}",
        s.location_timeout.as_secs()
    ));
    lines.push(format!("  fetch_timeout_secs: {}", s.fetch_timeout.as_secs()));
    lines.push(format!("  correlation: {}", s.correlation));
    lines.push(String::new());

    lines.push("api:".into());
    lines.push(format!("  flight_api: \"{}\"", config.api.flight_api));
    lines.push(format!(
        "  geolocation_api: \"{}\"",
        config.api.geolocation_api
    ));
    lines.push(String::new());

    lines.push("home:".into());
    match config.home.lat {
        Some(v) => lines.push(format!("  lat: {v}")),
        None => lines.push("  lat: null".into()),
    }
    match config.home.lon {
        Some(v) => lines.push(format!("  lon: {v}")),
        None => lines.push("  lon: null".into()),
    }

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
