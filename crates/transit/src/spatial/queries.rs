//! Distance calculations on geographic coordinates.
//!
//! Radius filtering happens in two stages: an R-tree lookup in raw degree
//! space culls the candidate set, then the haversine distance decides
//! membership. Only the haversine figure is ever reported to callers.

use geo::{HaversineDistance, Point};

/// Great-circle distance between two points in kilometers.
///
/// Spherical-earth haversine over the mean radius (6371.0088 km). Planar
/// approximations drift past acceptable error at the 1-10 km radii the
/// nearby-stop search runs at.
pub fn haversine_km(a: Point, b: Point) -> f64 {
    a.haversine_distance(&b) / 1000.0
}

/// Kilometers per degree of latitude, at its narrowest.
const MIN_KM_PER_DEGREE: f64 = 110.574;

/// Degree-space radius that is guaranteed to cover a `radius_km` circle
/// around a point at `latitude`.
///
/// Longitude degrees shrink with latitude, so the figure is corrected by
/// cos(latitude) and padded for the diagonal; the exact haversine test
/// trims the overshoot. The cosine is clamped so polar queries stay finite.
pub fn prefilter_radius_degrees(radius_km: f64, latitude: f64) -> f64 {
    let cos_lat = latitude.to_radians().cos().abs().max(0.01);
    1.5 * radius_km / (MIN_KM_PER_DEGREE * cos_lat)
}
