//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (outermost first)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │   Request ID     │ ← Generates / propagates X-Request-Id
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  Catch Panic     │ ← Generic 500, detail logged only
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ Security Headers │ ← nosniff, DENY, no-referrer, no-store (weather)
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │      CORS        │ ← Configured origin (weather) / `*` (tiles)
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  Catch Panic     │ ← Weather only, inside the security headers
//! └────────┬─────────┘
//!          │
//!          ▼
//!      Handler
//! ```
//!
//! `HEAD` is answered with 405 on both data routes; axum would otherwise run
//! the `GET` handler for it.
//!
//! # Routes
//!
//! - `/health` - Liveness and state sizes
//! - `/api/weather?city=` - Weather lookup
//! - `/api/tiles?layer=&z=&x=&y=` - Tile image proxy

use std::any::Any;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::handlers;
use crate::state::AppState;

/// Path of the weather lookup endpoint.
pub const WEATHER_PATH: &str = "/api/weather";

/// Path of the tile proxy endpoint.
pub const TILES_PATH: &str = "/api/tiles";

/// Build the application router with all routes and middleware configured.
///
/// # Errors
///
/// Returns `AppError::ConfigError` if `ALLOWED_ORIGIN` is not a valid header value.
pub fn build_router(state: AppState) -> AppResult<Router> {
    let config = &state.config;

    // =========================================================================
    // Weather: configured CORS origin plus fixed security headers
    // =========================================================================
    match config.allowed_origin.as_deref() {
        Some(origin) => info!(origin, "Weather CORS restricted to configured origin"),
        None => info!("Weather CORS open to any origin (no ALLOWED_ORIGIN set)"),
    }
    let weather = Router::new().route(
        WEATHER_PATH,
        get(handlers::get_weather)
            .head(handlers::weather_method_not_allowed)
            .options(handlers::preflight)
            .fallback(handlers::weather_method_not_allowed),
    );
    let weather = harden_weather(weather, build_cors_layer(config.allowed_origin.as_deref())?);

    // =========================================================================
    // Tiles: public content, always `*`
    // =========================================================================
    let tiles = Router::new()
        .route(
            TILES_PATH,
            get(handlers::get_tile)
                .head(handlers::tile_method_not_allowed)
                .options(handlers::preflight)
                .fallback(handlers::tile_method_not_allowed),
        )
        .layer(build_cors_layer(None)?);

    let router = Router::new()
        .route("/health", get(handlers::health_check))
        .merge(weather)
        .merge(tiles)
        // Applied bottom to top: the last layer runs first
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    Ok(router.with_state(state))
}

/// Wrap the weather routes so that every response, including CORS
/// preflights and panic 500s, carries the fixed security headers.
fn harden_weather<S>(router: Router<S>, cors: CorsLayer) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                )),
        )
}

/// Build a CORS layer for `GET`/`OPTIONS` with `Content-Type` allowed.
///
/// `None` or `"*"` allows any origin; anything else is emitted verbatim as
/// the single allowed origin.
fn build_cors_layer(allowed_origin: Option<&str>) -> AppResult<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match allowed_origin {
        None | Some("*") => Ok(cors.allow_origin(AnyOrigin)),
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .map_err(|e| AppError::ConfigError(format!("Invalid ALLOWED_ORIGIN: {e}")))?;
            Ok(cors.allow_origin(AllowOrigin::exact(origin)))
        }
    }
}

/// Turn a handler panic into the generic 500 body.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");

    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}
