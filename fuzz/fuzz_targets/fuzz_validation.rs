//! Fuzz testing for request input hardening.
//!
//! Feeds arbitrary text to the location sanitizer and arbitrary query values
//! to the tile validator. Beyond never panicking, it checks the properties
//! the handlers rely on:
//!
//! - An accepted location is non-empty, trimmed and stable under re-sanitizing
//! - An accepted tile request is within zoom and coordinate bounds
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_validation -- -max_total_time=60
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use geodata_gateway::validation::{
    MAX_TILE_COORD, MAX_ZOOM, sanitize_city, sanitize_text, validate_tile_request,
};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    city: Option<&'a str>,
    layer: Option<&'a str>,
    z: Option<&'a str>,
    x: Option<&'a str>,
    y: Option<&'a str>,
}

fuzz_target!(|input: Input<'_>| {
    if let Ok(city) = sanitize_city(input.city) {
        assert!(!city.is_empty());
        assert_eq!(city, city.trim());
        assert_eq!(sanitize_text(&city), city);
    }

    if let Ok(tile) = validate_tile_request(input.layer, input.z, input.x, input.y) {
        assert!(tile.coord.z <= MAX_ZOOM);
        assert!(tile.coord.x < MAX_TILE_COORD);
        assert!(tile.coord.y < MAX_TILE_COORD);
    }
});
