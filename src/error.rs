use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error types with appropriate HTTP status codes.
///
/// # Client-facing Messages
///
/// Every variant maps to a fixed, client-safe message. Whatever detail a
/// variant carries (upstream messages, transport errors, parse failures) is
/// written to the server log only and never serialized into a response.
///
/// # Tile Responses
///
/// The tile endpoint serves binary content, so apart from input validation
/// its failures are reported with empty bodies. See
/// [`AppError::into_tile_response`].
#[derive(Error, Debug)]
pub enum AppError {
    // Input validation (400)
    #[error("City parameter is missing or blank")]
    MissingCity,

    #[error("City parameter exceeds {0} characters")]
    CityTooLong(usize),

    #[error("City parameter contains no allowed characters")]
    InvalidCity,

    #[error("Unknown tile layer: {0}")]
    InvalidLayer(String),

    #[error("Invalid tile coordinates: {0}")]
    InvalidCoordinates(String),

    // Admission control (429)
    #[error("Rate limit exceeded for client {0}")]
    RateLimited(String),

    // Operational misconfiguration (500)
    #[error("Provider credential is not configured")]
    MissingApiKey,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Upstream failures
    #[error("Upstream request timed out after {0:?}")]
    UpstreamTimeout(std::time::Duration),

    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Upstream transport failure: {0}")]
    Transport(String),

    #[error("Malformed upstream payload: {0}")]
    MalformedUpstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body for API endpoints.
#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: &'static str,
}

impl AppError {
    /// HTTP status and client-safe message for this error.
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::MissingCity => (StatusCode::BAD_REQUEST, "City parameter is required"),
            AppError::CityTooLong(_) => (StatusCode::BAD_REQUEST, "City name is too long"),
            AppError::InvalidCity => (StatusCode::BAD_REQUEST, "Invalid city name"),
            AppError::InvalidLayer(_) => (StatusCode::BAD_REQUEST, "Invalid layer"),
            AppError::InvalidCoordinates(_) => (StatusCode::BAD_REQUEST, "Invalid tile coordinates"),

            AppError::RateLimited(_) => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests. Please try again later.",
            ),

            AppError::MissingApiKey | AppError::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server configuration error",
            ),

            AppError::UpstreamTimeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                "Weather service timed out. Please try again.",
            ),

            // Only the provider's status code informs the response; its
            // message stays in the log.
            AppError::Upstream { status: 404, .. } => {
                (StatusCode::NOT_FOUND, "Location not found")
            }
            AppError::Upstream { status, .. } => (
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                "Failed to fetch weather data",
            ),

            AppError::Transport(_) | AppError::MalformedUpstream(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ),
        }
    }

    /// Emit the error at a log level matching its severity.
    fn log(&self) {
        match self {
            AppError::MissingApiKey | AppError::ConfigError(_) => {
                tracing::error!(error = %self, "Operational alarm: gateway misconfigured");
            }
            AppError::MissingCity
            | AppError::CityTooLong(_)
            | AppError::InvalidCity
            | AppError::InvalidLayer(_)
            | AppError::InvalidCoordinates(_)
            | AppError::RateLimited(_) => {
                tracing::debug!(error = %self, "Request rejected");
            }
            AppError::UpstreamTimeout(_) | AppError::Upstream { .. } => {
                tracing::warn!(error = %self, "Upstream request failed");
            }
            AppError::Transport(_) | AppError::MalformedUpstream(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
            }
        }
    }

    /// Whether this error is an input-validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::MissingCity
                | AppError::CityTooLong(_)
                | AppError::InvalidCity
                | AppError::InvalidLayer(_)
                | AppError::InvalidCoordinates(_)
        )
    }

    /// Convert into a response for the binary tile endpoint.
    ///
    /// Validation failures keep their JSON body; everything else is reported
    /// with an empty body so the content type never contradicts the payload.
    /// Upstream non-2xx statuses are forwarded as-is and transport failures
    /// become 502.
    pub fn into_tile_response(self) -> Response {
        if self.is_validation() {
            return self.into_response();
        }

        self.log();
        let status = match &self {
            AppError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::MissingApiKey | AppError::ConfigError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_GATEWAY,
        };
        status.into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full error details server-side for debugging
        // but only expose sanitized messages to clients
        self.log();

        let (status, message) = self.status_and_message();
        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
