//! Street View URL parsing and map link generation.

use regex::Regex;
use std::sync::LazyLock;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"heading=([^&]+)").unwrap());

// `@lat,lng` (maps deep links) or `location=lat,lng` (Street View image API)
static COORDINATES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:@|location=)\s*(-?\d+(?:\.\d+)?)\s*(?:,|%2C)\s*(-?\d+(?:\.\d+)?)").unwrap()
});

pub const DEFAULT_HEADING: &str = "0";

/// `heading=` query value, or `"0"` when absent
pub fn extract_heading(url: &str) -> String {
    HEADING_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map_or_else(|| DEFAULT_HEADING.to_string(), |m| m.as_str().to_string())
}

/// First `@lat,lng` or `location=lat,lng` pair found in `url`
pub fn extract_coordinates(url: &str) -> Option<(f64, f64)> {
    let caps = COORDINATES_RE.captures(url)?;
    let lat = caps.get(1)?.as_str().parse().ok()?;
    let lng = caps.get(2)?.as_str().parse().ok()?;
    Some((lat, lng))
}

/// Street View deep link centred on `(latitude, longitude)` with default pan/tilt
pub fn public_url(latitude: f64, longitude: f64) -> String {
    format!(
        "https://www.google.com/maps/@{},{},3a,75y,0h,90t/data=!3m6!1e1!3m4!1s!2e0!7i16384!8i8192",
        format_coordinate(latitude),
        format_coordinate(longitude)
    )
}

/// Shortest round-trip decimal, always with a fractional part (`40` -> `40.0`)
fn format_coordinate(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

pub fn is_valid_latitude(value: f64) -> bool {
    value.is_finite() && (-90.0..=90.0).contains(&value)
}

pub fn is_valid_longitude(value: f64) -> bool {
    value.is_finite() && (-180.0..=180.0).contains(&value)
}
