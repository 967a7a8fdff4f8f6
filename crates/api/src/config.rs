use std::str::FromStr;

use glacier_core::velocity::VelocityConfig;

use crate::session::DEFAULT_MAX_SESSIONS;

/// Which geo backend serves the analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoBackendKind {
    /// Hosted Earth Engine via its REST API.
    EarthEngine,
    /// Built-in demo world; no network access.
    Memory,
}

impl FromStr for GeoBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earthengine" | "ee" => Ok(Self::EarthEngine),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "unknown geo backend '{other}', expected 'earthengine' or 'memory'"
            )),
        }
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event, for log shippers.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}', expected 'text' or 'json'")),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`). Velocity
    /// calculations against the hosted backend can take about a minute.
    pub request_timeout_secs: u64,
    pub geo_backend: GeoBackendKind,
    /// Sessions held in memory before the least recently updated one is
    /// evicted (default: `1024`).
    pub max_sessions: usize,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `120`                      |
    /// | `GEO_BACKEND`          | `earthengine`              |
    /// | `MAX_SESSIONS`         | `1024`                     |
    /// | `LOG_FORMAT`           | `text` (`text` or `json`)  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let geo_backend = std::env::var("GEO_BACKEND")
            .unwrap_or_else(|_| "earthengine".into())
            .parse()
            .unwrap_or_else(|e| panic!("GEO_BACKEND: {e}"));

        let max_sessions = env_or("MAX_SESSIONS", DEFAULT_MAX_SESSIONS);

        let log_format = std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "text".into())
            .parse()
            .unwrap_or_else(|e| panic!("LOG_FORMAT: {e}"));

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            geo_backend,
            max_sessions,
            log_format,
        }
    }
}

/// Velocity tuning from environment variables, falling back to
/// [`VelocityConfig::default`] for anything unset.
///
/// | Env Var                  | Default |
/// |--------------------------|---------|
/// | `VELOCITY_WINDOW_DAYS`   | `30`    |
/// | `VELOCITY_MAX_CLOUD_PCT` | `20`    |
/// | `VELOCITY_MAX_OFFSET`    | `100`   |
/// | `VELOCITY_PATCH_WIDTH`   | `256`   |
/// | `VELOCITY_STATS_SCALE`   | `100`   |
pub fn velocity_config_from_env() -> VelocityConfig {
    let defaults = VelocityConfig::default();
    VelocityConfig {
        window_days: env_or("VELOCITY_WINDOW_DAYS", defaults.window_days),
        max_cloud_pct: env_or("VELOCITY_MAX_CLOUD_PCT", defaults.max_cloud_pct),
        max_offset: env_or("VELOCITY_MAX_OFFSET", defaults.max_offset),
        patch_width: env_or("VELOCITY_PATCH_WIDTH", defaults.patch_width),
        stats_scale: env_or("VELOCITY_STATS_SCALE", defaults.stats_scale),
        ..defaults
    }
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid number: {e}")),
        Err(_) => default,
    }
}
