//! Weather lookup endpoint.
//!
//! # Pipeline
//!
//! ```text
//! city ─► sanitize ─► rate limit ─► cache ─┬─ hit ──────────────────────────► 200 X-Cache: HIT
//!  400      400          429               └─ miss ─► credential ─► provider ─► shape ─► store ─► 200 X-Cache: MISS
//!                                                       500          504/4xx/5xx   500
//! ```
//!
//! Validation and rate limiting short-circuit before any upstream call.
//! Failures after the cache lookup still carry `X-Cache: MISS`.

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{debug, info, instrument};

use crate::client_key::client_key;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::metrics;
use crate::models::{WeatherQuery, WeatherReport};
use crate::state::AppState;
use crate::validation::sanitize_city;

/// Response header marking whether the body came from the cache.
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache");

/// Look up current weather for `?city=`.
///
/// # Response Body
///
/// ```json
/// {
///   "name": "London",
///   "coord": { "lat": 51.51, "lon": -0.13 },
///   "sys": { "country": "GB", "sunrise": 1705305600, "sunset": 1705336200 },
///   "weather": [{ "main": "Clouds", "description": "overcast clouds" }],
///   "main": { "temp": 7.2, "feels_like": 4.9, "temp_min": 6.1, "temp_max": 8.3, "humidity": 81, "pressure": 1012 },
///   "wind": { "speed": 4.1 },
///   "visibility": 10000,
///   "timezone": 0
/// }
/// ```
#[instrument(skip(state, headers, query))]
pub async fn get_weather(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<WeatherQuery>, QueryRejection>,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_else(|e| {
        debug!(error = %e, "Unparseable weather query string");
        WeatherQuery::default()
    });

    lookup_weather(&state, &headers, query)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

async fn lookup_weather(
    state: &AppState,
    headers: &HeaderMap,
    query: WeatherQuery,
) -> AppResult<Response> {
    // Validation comes first: malformed input is a 400 and never spends quota,
    // even when the client is already over its limit.
    let city = sanitize_city(query.city.as_deref())?;

    let client = client_key(headers);
    if !state.limiter.admit(&client) {
        metrics::record_rate_limited();
        return Err(AppError::RateLimited(client.into_owned()));
    }

    let cache_key = city.to_lowercase();
    if let Some(body) = state.weather_cache.lookup(&cache_key) {
        metrics::record_cache_lookup(true);
        debug!(city = %cache_key, "Weather cache hit");
        return Ok(weather_response(body, "HIT"));
    }
    metrics::record_cache_lookup(false);

    // Past the cache lookup every outcome, failures included, is a miss
    match fetch_and_store(state, &city, cache_key).await {
        Ok(body) => Ok(weather_response(body, "MISS")),
        Err(e) => {
            let mut response = e.into_response();
            response
                .headers_mut()
                .insert(CACHE_STATUS_HEADER, HeaderValue::from_static("MISS"));
            Ok(response)
        }
    }
}

async fn fetch_and_store(state: &AppState, city: &str, cache_key: String) -> AppResult<Bytes> {
    let url = state.provider.weather_url(city)?;
    let payload = state.provider.fetch_json(url).await?;
    let report = WeatherReport::from_provider(payload)?;
    let body = Bytes::from(
        serde_json::to_vec(&report).map_err(|e| AppError::Internal(e.to_string()))?,
    );

    state.weather_cache.store(cache_key, body.clone());
    metrics::set_state_sizes(state.weather_cache.len(), state.limiter.tracked_clients());
    info!(city = %report.name, "Weather fetched from provider");

    Ok(body)
}

fn weather_response(body: Bytes, cache_status: &'static str) -> Response {
    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            ),
            (CACHE_STATUS_HEADER, HeaderValue::from_static(cache_status)),
        ],
        body,
    )
        .into_response()
}

/// Any method other than `GET` and `OPTIONS`.
pub async fn weather_method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse {
            error: "Method not allowed",
        }),
    )
        .into_response()
}
