//! Provider weather payload and its public projection.
//!
//! The provider document is treated as untrusted: only the fields listed on
//! [`WeatherReport`] are copied out, so new or undocumented provider fields
//! can never reach clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

// =============================================================================
// Provider Payload (input)
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawWeather {
    #[serde(default)]
    name: String,
    coord: Option<RawCoord>,
    sys: Option<RawSys>,
    weather: Option<Vec<RawCondition>>,
    main: Option<RawMain>,
    wind: Option<RawWind>,
    visibility: Option<u32>,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct RawCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct RawSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawCondition {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct RawMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u32,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct RawWind {
    speed: Option<f64>,
}

// =============================================================================
// Public Contract (output)
// =============================================================================

/// Public weather response. Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub name: String,
    pub coord: Coord,
    pub sys: SunTimes,
    pub weather: Vec<Condition>,
    pub main: Readings,
    pub wind: Wind,
    pub visibility: Option<u32>,
    /// Offset from UTC in seconds.
    pub timezone: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunTimes {
    pub country: Option<String>,
    /// Unix epoch seconds.
    pub sunrise: Option<i64>,
    /// Unix epoch seconds.
    pub sunset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u32,
    pub pressure: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

// =============================================================================
// Field Shaper
// =============================================================================

fn missing(field: &str) -> AppError {
    AppError::MalformedUpstream(format!("provider payload has no `{field}`"))
}

impl WeatherReport {
    /// Project a provider payload onto the public contract.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MalformedUpstream` if the condition list, `main`,
    /// `sys` or `coord` is absent, or a projected field has the wrong type.
    pub fn from_provider(payload: Value) -> AppResult<Self> {
        let raw: RawWeather = serde_json::from_value(payload)
            .map_err(|e| AppError::MalformedUpstream(e.to_string()))?;

        let condition = raw
            .weather
            .ok_or_else(|| missing("weather"))?
            .into_iter()
            .next()
            .ok_or_else(|| missing("weather[0]"))?;
        let main = raw.main.ok_or_else(|| missing("main"))?;
        let sys = raw.sys.ok_or_else(|| missing("sys"))?;
        let coord = raw.coord.ok_or_else(|| missing("coord"))?;

        Ok(Self {
            name: raw.name,
            coord: Coord {
                lat: coord.lat,
                lon: coord.lon,
            },
            sys: SunTimes {
                country: sys.country,
                sunrise: sys.sunrise,
                sunset: sys.sunset,
            },
            weather: vec![Condition {
                main: condition.main,
                description: condition.description,
            }],
            main: Readings {
                temp: main.temp,
                feels_like: main.feels_like,
                temp_min: main.temp_min,
                temp_max: main.temp_max,
                humidity: main.humidity,
                pressure: main.pressure,
            },
            wind: Wind {
                speed: raw.wind.and_then(|w| w.speed).unwrap_or(0.0),
            },
            visibility: raw.visibility,
            timezone: raw.timezone,
        })
    }
}
