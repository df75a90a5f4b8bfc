mod api;
mod weather;

pub use api::{HealthResponse, TileQuery, WeatherQuery};
pub use weather::{Condition, Coord, Readings, SunTimes, WeatherReport, Wind};
