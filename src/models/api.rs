use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Query string for the weather endpoint.
///
/// Kept as raw text: validation happens in the handler so that the error
/// taxonomy, not the extractor, decides the response.
#[derive(Debug, Default, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
}

/// Query string for the tile endpoint; all values arrive as text.
#[derive(Debug, Default, Deserialize)]
pub struct TileQuery {
    pub layer: Option<String>,
    pub z: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy", or "degraded" when the provider credential is missing
    pub status: String,
    /// Whether a provider credential is configured (never the value)
    pub provider_configured: bool,
    /// Application version
    pub version: String,
    /// Current server time
    pub timestamp: DateTime<Utc>,
    /// Seconds since startup
    pub uptime_seconds: u64,
    /// Entries currently held by the weather cache
    pub cache_entries: usize,
    /// Client keys currently tracked by the rate limiter
    pub tracked_clients: usize,
}
