//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible defaults
//! for development. In production, configure via environment variables or a `.env` file.
//!
//! # Security Configuration
//!
//! - `OPENWEATHER_API_KEY`: Provider credential. Optional at startup; when it is
//!   missing every data-fetching request fails with a 500 and an operational alarm
//!   is logged. It is never echoed to clients or printed by `Debug`.
//! - `ALLOWED_ORIGIN`: CORS origin for the weather endpoint (default: `*`)
//!
//! # Abuse & Load Controls
//!
//! - `RATE_LIMIT_MAX_REQUESTS`: Admissions per client per window (default: 10)
//! - `RATE_LIMIT_WINDOW_SECS`: Sliding window length (default: 60)
//! - `RATE_LIMIT_MAX_CLIENTS`: Registry size that triggers stale-key compaction (default: 10000)
//! - `CACHE_TTL_SECS`: Weather response freshness (default: 300)
//! - `CACHE_MAX_ENTRIES`: Weather cache capacity (default: 100)
//! - `UPSTREAM_TIMEOUT_MS`: Bound on every provider call (default: 5000)

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Default provider endpoint for current weather data.
pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Default provider base for map tile overlays.
pub const DEFAULT_TILE_API_URL: &str = "https://tile.openweathermap.org/map";

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    // =========================================================================
    // Provider Configuration
    // =========================================================================
    /// Provider credential, appended to upstream requests only
    pub api_key: Option<String>,

    /// Current-weather JSON endpoint
    pub weather_api_url: String,

    /// Tile image base URL; `/{layer}/{z}/{x}/{y}.png` is appended
    pub tile_api_url: String,

    /// Bound on every upstream call, including reading the body (default: 5s)
    pub upstream_timeout: Duration,

    // =========================================================================
    // Rate Limiting Configuration
    // =========================================================================
    /// Maximum admitted requests per client within one window (default: 10)
    pub rate_limit_max_requests: usize,

    /// Sliding window length (default: 60s)
    pub rate_limit_window: Duration,

    /// Distinct-client count above which stale clients are swept (default: 10000)
    pub rate_limit_max_clients: usize,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// How long a cached weather response stays servable (default: 5 minutes)
    pub cache_ttl: Duration,

    /// Maximum number of cached weather responses (default: 100)
    pub cache_max_entries: usize,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Allowed CORS origin for the weather endpoint; `None` allows any origin
    pub allowed_origin: Option<String>,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any configuration value is invalid
    /// (e.g., non-numeric PORT value, zero-length rate window).
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 3000)?,

            // Provider
            api_key: Self::optional_env("OPENWEATHER_API_KEY"),
            weather_api_url: env::var("WEATHER_API_URL")
                .unwrap_or_else(|_| DEFAULT_WEATHER_API_URL.to_string()),
            tile_api_url: env::var("TILE_API_URL")
                .unwrap_or_else(|_| DEFAULT_TILE_API_URL.to_string()),
            upstream_timeout: Duration::from_millis(Self::parse_env("UPSTREAM_TIMEOUT_MS", 5000)?),

            // Rate limiting
            rate_limit_max_requests: Self::parse_env("RATE_LIMIT_MAX_REQUESTS", 10)?,
            rate_limit_window: Duration::from_secs(Self::parse_env("RATE_LIMIT_WINDOW_SECS", 60)?),
            rate_limit_max_clients: Self::parse_env("RATE_LIMIT_MAX_CLIENTS", 10_000)?,

            // Cache
            cache_ttl: Duration::from_secs(Self::parse_env("CACHE_TTL_SECS", 300)?),
            cache_max_entries: Self::parse_env("CACHE_MAX_ENTRIES", 100)?,

            // Security
            allowed_origin: Self::optional_env("ALLOWED_ORIGIN"),

            // Observability
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    pub fn validate(&self) -> AppResult<()> {
        if self.upstream_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "UPSTREAM_TIMEOUT_MS must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_max_requests == 0 {
            return Err(AppError::ConfigError(
                "RATE_LIMIT_MAX_REQUESTS must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_window.is_zero() {
            return Err(AppError::ConfigError(
                "RATE_LIMIT_WINDOW_SECS must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_max_clients == 0 {
            return Err(AppError::ConfigError(
                "RATE_LIMIT_MAX_CLIENTS must be greater than 0".to_string(),
            ));
        }

        if self.cache_max_entries == 0 {
            return Err(AppError::ConfigError(
                "CACHE_MAX_ENTRIES must be greater than 0".to_string(),
            ));
        }

        for (name, url) in [
            ("WEATHER_API_URL", &self.weather_api_url),
            ("TILE_API_URL", &self.tile_api_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(AppError::ConfigError(format!(
                    "{name} must be an absolute http(s) URL"
                )));
            }
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if the provider credential is present.
    pub fn provider_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .trim()
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Read an optional string variable, treating blank values as unset.
    fn optional_env(name: &str) -> Option<String> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

// Manual impl so the credential never lands in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("weather_api_url", &self.weather_api_url)
            .field("tile_api_url", &self.tile_api_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window", &self.rate_limit_window)
            .field("rate_limit_max_clients", &self.rate_limit_max_clients)
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_max_entries", &self.cache_max_entries)
            .field("allowed_origin", &self.allowed_origin)
            .field("metrics_port", &self.metrics_port)
            .finish()
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 3000,
            // Provider
            api_key: None,
            weather_api_url: DEFAULT_WEATHER_API_URL.to_string(),
            tile_api_url: DEFAULT_TILE_API_URL.to_string(),
            upstream_timeout: Duration::from_secs(5),
            // Rate limiting
            rate_limit_max_requests: 10,
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max_clients: 10_000,
            // Cache
            cache_ttl: Duration::from_secs(300),
            cache_max_entries: 100,
            // Security
            allowed_origin: None,
            // Observability
            metrics_port: 9090,
        }
    }
}
