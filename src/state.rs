//! Shared application state for Axum handlers.
//!
//! This module provides thread-safe, clonable state that is shared across
//! all request handlers. It includes:
//!
//! - **Rate Limiter**: Per-client sliding-window admission control
//! - **Response Cache**: Bounded TTL cache of shaped weather responses
//! - **Provider Client**: Timeout-bounded upstream HTTP client
//! - **Configuration**: Runtime configuration access
//!
//! # Thread Safety
//!
//! The limiter and cache each guard their compound read-modify-write
//! operations with an internal mutex; everything else is immutable after
//! startup. All of it lives only as long as the process.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;

use crate::config::Config;
use crate::error::AppResult;
use crate::provider::ProviderClient;
use crate::services::{RateLimitPolicy, ResponseCache, SlidingWindowLimiter};

/// Shared application state for Axum handlers.
///
/// This struct is cloned for each request handler. All internal data
/// is wrapped in `Arc` for efficient sharing.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Upstream provider client
    pub provider: ProviderClient,
    /// Weather endpoint rate limiter, keyed by client address
    pub limiter: Arc<SlidingWindowLimiter>,
    /// Serialized weather responses keyed by normalized location
    pub weather_cache: Arc<ResponseCache<Bytes>>,
    /// Timestamp when the application started
    pub started_at: Instant,
}

impl AppState {
    /// Create new application state from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the provider client cannot be built.
    pub fn new(config: Config) -> AppResult<Self> {
        let provider = ProviderClient::new(&config)?;
        let limiter = SlidingWindowLimiter::new(RateLimitPolicy {
            max_requests: config.rate_limit_max_requests,
            window: config.rate_limit_window,
            max_clients: config.rate_limit_max_clients,
        });
        let weather_cache = ResponseCache::new(config.cache_ttl, config.cache_max_entries);

        Ok(Self {
            config: Arc::new(config),
            provider,
            limiter: Arc::new(limiter),
            weather_cache: Arc::new(weather_cache),
            started_at: Instant::now(),
        })
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
