//! Great-circle distance for proximity discovery

use vicinity_database::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two geographic coordinates, in kilometers.
///
/// Coordinates are `(longitude, latitude)` degree pairs; planar Euclidean
/// distance is wrong at this scale.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
