//! Timeout-bounded HTTP client for the geodata provider.
//!
//! This module wraps a single pooled `reqwest::Client` with:
//!
//! - **Hard Timeouts**: every call, including reading the body, is bounded by
//!   `config.upstream_timeout`. On expiry the request future is dropped, which
//!   aborts the in-flight connection rather than leaving it running.
//! - **Credential Hygiene**: the provider key is only ever placed in the
//!   outbound query string. Logged URLs are reduced to their path and
//!   transport errors are stripped of their URL before being recorded.
//! - **Typed Failures**: timeouts, non-2xx statuses, transport errors and
//!   unparseable payloads surface as distinct [`AppError`] variants.
//!
//! # Example
//!
//! ```rust,ignore
//! let provider = ProviderClient::new(&config)?;
//! let url = provider.weather_url("London")?;
//! let payload = provider.fetch_json(url).await?;
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::validation::TileRequest;

/// Which kind of upstream resource a call fetches, for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Weather,
    Tile,
}

impl FetchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchKind::Weather => "weather",
            FetchKind::Tile => "tile",
        }
    }
}

/// Error body shape returned by the provider on non-2xx responses.
#[derive(Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the weather and tile provider.
///
/// Cheap to clone: the underlying connection pool and key are shared.
#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    api_key: Option<Arc<str>>,
    weather_url: Url,
    tile_url: Url,
    timeout: Duration,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("weather_url", &self.weather_url.as_str())
            .field("tile_url", &self.tile_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if a provider URL does not parse or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &Config) -> AppResult<Self> {
        let weather_url = Url::parse(&config.weather_api_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid WEATHER_API_URL: {e}")))?;
        let tile_url = Url::parse(&config.tile_api_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid TILE_API_URL: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: config.api_key.as_deref().map(Arc::from),
            weather_url,
            tile_url,
            timeout: config.upstream_timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn api_key(&self) -> AppResult<&str> {
        self.api_key.as_deref().ok_or(AppError::MissingApiKey)
    }

    /// Build the current-weather URL for an already sanitized location.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MissingApiKey` if no credential is configured.
    pub fn weather_url(&self, city: &str) -> AppResult<Url> {
        let key = self.api_key()?;
        let mut url = self.weather_url.clone();
        url.query_pairs_mut()
            .append_pair("q", city)
            .append_pair("appid", key)
            .append_pair("units", "metric");
        Ok(url)
    }

    /// Build the tile image URL from parsed, bounds-checked coordinates.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MissingApiKey` if no credential is configured.
    pub fn tile_url(&self, tile: &TileRequest) -> AppResult<Url> {
        let key = self.api_key()?;
        let mut url = self.tile_url.clone();
        url.path_segments_mut()
            .map_err(|()| AppError::Internal("TILE_API_URL cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push(tile.layer.as_str())
            .push(&tile.coord.z.to_string())
            .push(&tile.coord.x.to_string())
            .push(&format!("{}.png", tile.coord.y));
        url.query_pairs_mut().append_pair("appid", key);
        Ok(url)
    }

    /// Fetch and parse a JSON document.
    ///
    /// # Errors
    ///
    /// - `UpstreamTimeout` if the call exceeds the configured bound
    /// - `Upstream` for non-2xx statuses (the provider message is kept for logs)
    /// - `Transport` for connection-level failures
    /// - `MalformedUpstream` if a 2xx body is not valid JSON
    pub async fn fetch_json(&self, url: Url) -> AppResult<serde_json::Value> {
        let (status, body) = self.fetch(FetchKind::Weather, url).await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ProviderErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_default();
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| AppError::MalformedUpstream(e.to_string()))
    }

    /// Fetch a binary payload such as a tile image.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_json`](Self::fetch_json), minus JSON parsing.
    pub async fn fetch_binary(&self, url: Url) -> AppResult<Bytes> {
        let (status, body) = self.fetch(FetchKind::Tile, url).await?;

        if !status.is_success() {
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message: String::new(),
            });
        }

        Ok(body)
    }

    /// Perform one bounded GET and read the full body.
    #[instrument(skip(self, url), fields(kind = kind.as_str(), path = %url.path()))]
    async fn fetch(&self, kind: FetchKind, url: Url) -> AppResult<(StatusCode, Bytes)> {
        let started = Instant::now();
        let request = self.http.get(url);

        let result = tokio::time::timeout(self.timeout, async move {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        })
        .await;

        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(Ok((status, body))) => {
                debug!(status = status.as_u16(), bytes = body.len(), "Upstream responded");
                metrics::record_upstream_request(kind.as_str(), status.as_str(), elapsed);
                Ok((status, body))
            }
            Ok(Err(e)) if e.is_timeout() => {
                metrics::record_upstream_request(kind.as_str(), "timeout", elapsed);
                Err(AppError::UpstreamTimeout(self.timeout))
            }
            Ok(Err(e)) => {
                let e = e.without_url();
                warn!(error = %e, "Upstream transport failure");
                metrics::record_upstream_request(kind.as_str(), "transport_error", elapsed);
                Err(AppError::Transport(e.to_string()))
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "Upstream request timed out, aborting");
                metrics::record_upstream_request(kind.as_str(), "timeout", elapsed);
                Err(AppError::UpstreamTimeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::validation::{Layer, TileCoordinate};

    fn client(api_key: Option<&str>) -> ProviderClient {
        let config = Config {
            api_key: api_key.map(str::to_string),
            weather_api_url: "https://weather.example/data/2.5/weather".to_string(),
            tile_api_url: "https://tiles.example/map/".to_string(),
            ..Config::default()
        };
        ProviderClient::new(&config).unwrap()
    }

    #[test]
    fn test_weather_url_encodes_city() {
        let url = client(Some("k3y")).weather_url("São Paulo, BR").unwrap();
        assert_eq!(url.path(), "/data/2.5/weather");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "São Paulo, BR".to_string()),
                ("appid".to_string(), "k3y".to_string()),
                ("units".to_string(), "metric".to_string()),
            ]
        );
    }

    #[test]
    fn test_tile_url_uses_parsed_coordinates() {
        let tile = TileRequest {
            layer: Layer::Precipitation,
            coord: TileCoordinate { z: 3, x: 4, y: 5 },
        };
        let url = client(Some("k3y")).tile_url(&tile).unwrap();
        assert_eq!(url.path(), "/map/precipitation_new/3/4/5.png");
        assert_eq!(url.query(), Some("appid=k3y"));
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let provider = client(None);
        assert!(matches!(
            provider.weather_url("London"),
            Err(AppError::MissingApiKey)
        ));
        let tile = TileRequest {
            layer: Layer::Wind,
            coord: TileCoordinate { z: 0, x: 0, y: 0 },
        };
        assert!(matches!(
            provider.tile_url(&tile),
            Err(AppError::MissingApiKey)
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", client(Some("very-secret")));
        assert!(!rendered.contains("very-secret"));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        // Port 9 (discard) on localhost is almost never listening
        let config = Config {
            api_key: Some("k".to_string()),
            weather_api_url: "http://127.0.0.1:9/weather".to_string(),
            upstream_timeout: Duration::from_secs(2),
            ..Config::default()
        };
        let provider = ProviderClient::new(&config).unwrap();
        let url = provider.weather_url("London").unwrap();

        match provider.fetch_json(url).await {
            Err(AppError::Transport(msg)) => assert!(!msg.contains("appid")),
            Err(AppError::UpstreamTimeout(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
