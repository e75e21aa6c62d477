// ABOUTME: Great-circle distance between two GPS points using the Haversine formula.
// ABOUTME: Produces the distance report returned to the language model by the distance tool.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A point in decimal degrees. Inputs are not range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceEndpoints {
    pub point1: GeoPoint,
    pub point2: GeoPoint,
}

/// Distance between two points, rounded to centimeters and meters
/// respectively, with the inputs echoed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceReport {
    pub distance_meters: f64,
    pub distance_km: f64,
    pub coordinates: DistanceEndpoints,
}

/// Haversine distance from `a` to `b`.
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> DistanceReport {
    let meters = haversine_meters(a, b);
    DistanceReport {
        distance_meters: round_to(meters, 2),
        distance_km: round_to(meters / 1000.0, 3),
        coordinates: DistanceEndpoints {
            point1: a,
            point2: b,
        },
    }
}

/// Unrounded Haversine distance in meters.
pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
