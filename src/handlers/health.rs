//! Health endpoint.
//!
//! `GET /health` always answers 200 and reports "degraded" when the provider
//! credential is missing, since every data request would then fail with 500.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use tracing::instrument;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint.
///
/// # Response Body
///
/// ```json
/// {
///   "status": "healthy",
///   "provider_configured": true,
///   "version": "0.1.0",
///   "timestamp": "2024-01-15T10:30:00Z",
///   "uptime_seconds": 3600,
///   "cache_entries": 12,
///   "tracked_clients": 40
/// }
/// ```
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_configured = state.config.provider_configured();

    Json(HealthResponse {
        status: if provider_configured {
            "healthy"
        } else {
            "degraded"
        }
        .to_string(),
        provider_configured,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.uptime_seconds(),
        cache_entries: state.weather_cache.len(),
        tracked_clients: state.limiter.tracked_clients(),
    })
}
