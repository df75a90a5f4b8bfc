//! Input validation for everything that crosses into the gateway.
//!
//! - [`sanitize_city`]: free-text location input for the weather endpoint
//! - [`validate_tile_request`]: layer and `z/x/y` coordinates for the tile proxy
//!
//! Both are pure functions. Nothing returned from here is ever the raw client
//! text: callers only see cleaned strings or parsed integers.

use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

// =============================================================================
// Validation Constants
// =============================================================================

/// Maximum length of the raw city parameter, in characters.
///
/// Checked before sanitization so padding with stripped characters cannot
/// smuggle an oversized value past the bound.
pub const MAX_CITY_LENGTH: usize = 100;

/// Highest zoom level the provider serves.
pub const MAX_ZOOM: u8 = 22;

/// Exclusive upper bound for tile `x` and `y`, applied at every zoom level.
///
/// This is the grid size at [`MAX_ZOOM`]; a tighter `2^z` bound per zoom is
/// not enforced.
pub const MAX_TILE_COORD: u32 = 1 << 22;

/// Latin-1 Supplement through Latin Extended-B.
const ACCENTED_LATIN: std::ops::RangeInclusive<char> = '\u{00C0}'..='\u{024F}';

// =============================================================================
// Sanitizer
// =============================================================================

fn is_allowed_city_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || (ACCENTED_LATIN.contains(&c) && c.is_alphabetic())
        || c.is_whitespace()
        || matches!(c, '-' | '\'' | '.' | ',')
}

/// Strip every disallowed character and trim surrounding whitespace.
///
/// Total and idempotent: `sanitize_text(&sanitize_text(s)) == sanitize_text(s)`.
pub fn sanitize_text(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|&c| is_allowed_city_char(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Validate and clean the `city` query parameter.
///
/// Rules:
/// - Absent or blank after trimming: `MissingCity`
/// - More than [`MAX_CITY_LENGTH`] characters as received: `CityTooLong`
/// - Nothing left after stripping disallowed characters: `InvalidCity`
///
/// Allowed characters are ASCII letters and digits, accented Latin letters,
/// whitespace, hyphens, apostrophes, periods and commas. Anything else is
/// silently dropped.
pub fn sanitize_city(raw: Option<&str>) -> AppResult<String> {
    let raw = match raw {
        Some(r) if !r.trim().is_empty() => r,
        _ => return Err(AppError::MissingCity),
    };

    if raw.chars().count() > MAX_CITY_LENGTH {
        return Err(AppError::CityTooLong(MAX_CITY_LENGTH));
    }

    let cleaned = sanitize_text(raw);
    if cleaned.is_empty() {
        return Err(AppError::InvalidCity);
    }

    Ok(cleaned)
}

// =============================================================================
// Coordinate Validator
// =============================================================================

/// Map overlay layers the provider is allowed to be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Precipitation,
    Clouds,
    Wind,
    Temperature,
}

impl Layer {
    pub const ALL: [Layer; 4] = [
        Layer::Precipitation,
        Layer::Clouds,
        Layer::Wind,
        Layer::Temperature,
    ];

    /// Provider identifier for this layer.
    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Precipitation => "precipitation_new",
            Layer::Clouds => "clouds_new",
            Layer::Wind => "wind_new",
            Layer::Temperature => "temp_new",
        }
    }
}

impl FromStr for Layer {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Layer::ALL
            .into_iter()
            .find(|layer| layer.as_str() == s)
            .ok_or_else(|| AppError::InvalidLayer(s.chars().take(32).collect()))
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bounds-checked tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoordinate {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

/// A validated tile request: only these parsed values reach the upstream URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRequest {
    pub layer: Layer,
    pub coord: TileCoordinate,
}

/// Parse one coordinate as a plain base-10 integer strictly below `bound`.
///
/// Signs, whitespace and trailing garbage are all rejected.
fn parse_coordinate(name: &str, raw: Option<&str>, bound: u64) -> AppResult<u64> {
    let raw = raw.ok_or_else(|| AppError::InvalidCoordinates(format!("{name} is missing")))?;

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::InvalidCoordinates(format!(
            "{name} is not a base-10 integer"
        )));
    }

    match raw.parse::<u64>() {
        Ok(value) if value < bound => Ok(value),
        _ => Err(AppError::InvalidCoordinates(format!("{name} is out of range"))),
    }
}

/// Validate a tile request.
///
/// The layer must be one of [`Layer::ALL`]; `z` must be in `0..=22`; `x` and
/// `y` must be in `0..2^22` regardless of `z`. The layer is checked first.
pub fn validate_tile_request(
    layer: Option<&str>,
    z: Option<&str>,
    x: Option<&str>,
    y: Option<&str>,
) -> AppResult<TileRequest> {
    let layer: Layer = layer.unwrap_or_default().parse()?;

    let z = parse_coordinate("z", z, u64::from(MAX_ZOOM) + 1)?;
    let x = parse_coordinate("x", x, u64::from(MAX_TILE_COORD))?;
    let y = parse_coordinate("y", y, u64::from(MAX_TILE_COORD))?;

    // Bounds above guarantee these conversions succeed.
    let coord = TileCoordinate {
        z: u8::try_from(z).map_err(|e| AppError::InvalidCoordinates(e.to_string()))?,
        x: u32::try_from(x).map_err(|e| AppError::InvalidCoordinates(e.to_string()))?,
        y: u32::try_from(y).map_err(|e| AppError::InvalidCoordinates(e.to_string()))?,
    };

    Ok(TileRequest { layer, coord })
}
