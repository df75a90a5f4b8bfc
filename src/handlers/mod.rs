mod health;
mod tiles;
mod weather;

use axum::http::StatusCode;

pub use health::health_check;
pub use tiles::{get_tile, tile_method_not_allowed};
pub use weather::{get_weather, weather_method_not_allowed};

/// Cross-origin preflight: an empty 200.
///
/// Browsers' CORS preflights are answered by the CORS layer before reaching
/// this; it only sees bare `OPTIONS` requests.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
