//! Map tile proxy endpoint.
//!
//! Tiles carry no per-client data, so responses are publicly cacheable for
//! ten minutes and CORS is always open. Failures after validation use empty
//! bodies to stay consistent with the binary content type.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{debug, instrument};

use crate::error::AppResult;
use crate::models::TileQuery;
use crate::state::AppState;
use crate::validation::validate_tile_request;

/// `Cache-Control` for successful tile responses.
pub const TILE_CACHE_CONTROL: &str = "public, max-age=600";

/// Proxy one tile image for `?layer=&z=&x=&y=`.
#[instrument(skip(state, query))]
pub async fn get_tile(
    State(state): State<AppState>,
    query: Result<Query<TileQuery>, QueryRejection>,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_else(|e| {
        debug!(error = %e, "Unparseable tile query string");
        TileQuery::default()
    });

    match fetch_tile(&state, query).await {
        Ok(response) => response,
        Err(e) => e.into_tile_response(),
    }
}

async fn fetch_tile(state: &AppState, query: TileQuery) -> AppResult<Response> {
    let tile = validate_tile_request(
        query.layer.as_deref(),
        query.z.as_deref(),
        query.x.as_deref(),
        query.y.as_deref(),
    )?;

    let url = state.provider.tile_url(&tile)?;
    let image = state.provider.fetch_binary(url).await?;

    debug!(
        layer = %tile.layer,
        z = tile.coord.z,
        x = tile.coord.x,
        y = tile.coord.y,
        bytes = image.len(),
        "Tile proxied"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, TILE_CACHE_CONTROL),
        ],
        image,
    )
        .into_response())
}

/// Any method other than `GET` and `OPTIONS`.
pub async fn tile_method_not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}
