//! # Geodata Gateway
//!
//! A hardened HTTP gateway in front of a credentialed weather and map-tile
//! provider, featuring:
//!
//! - **Credential Isolation**: The provider key is attached server-side and
//!   never reaches clients or logs
//! - **Input Hardening**: Allow-list sanitization and tile coordinate bounds
//! - **Abuse Control**: Per-client sliding-window rate limiting
//! - **Quota Protection**: Bounded TTL cache of shaped weather responses
//! - **Observability**: Request IDs, structured logging, Prometheus metrics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Request ID → Trace → Catch Panic → CORS)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (health, weather, tiles)                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Services (SlidingWindowLimiter, ResponseCache)             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ProviderClient (timeout-bounded, credential attached)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Weather / Tile Provider (HTTPS)                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geodata_gateway::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let state = AppState::new(config)?;
//!     let app = build_router(state)?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```bash
//! OPENWEATHER_API_KEY=your-key ALLOWED_ORIGIN=https://app.example.com cargo run
//! ```

pub mod client_key;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod provider;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use provider::ProviderClient;
pub use routes::build_router;
pub use state::AppState;
