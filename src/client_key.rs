//! Client identity for rate limiting.
//!
//! # Security Warning: IP Spoofing Risk
//!
//! The key is taken from the first entry of the `X-Forwarded-For` chain,
//! which any client can set directly. It is a throttling heuristic, not an
//! identity: deploy behind a reverse proxy or platform edge that overwrites
//! the header with the real peer address.
//!
//! ## The "unknown" Fallback
//!
//! Requests without a usable header all share the [`UNKNOWN_CLIENT`] key,
//! so they are rate-limited collectively. Monitor for high "unknown"
//! traffic; it usually means the proxy is not setting the header.

use std::borrow::Cow;

use axum::http::HeaderMap;

/// Fallback key when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Derive the rate-limit key for a request.
///
/// Format of the header: `"client, proxy1, proxy2"`; only the first entry is
/// used. Missing, non-UTF-8 or blank values fall back to [`UNKNOWN_CLIENT`].
///
/// Returns `Cow::Borrowed` for the fallback so the common miss path does not
/// allocate.
#[inline]
pub fn client_key(headers: &HeaderMap) -> Cow<'static, str> {
    headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map_or(Cow::Borrowed(UNKNOWN_CLIENT), |ip| Cow::Owned(ip.to_string()))
}
