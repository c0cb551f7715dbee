//! User entity definitions

use serde::{Deserialize, Serialize};

/// A geographic coordinate as `(longitude, latitude)` in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// A registered user. Credentials live with the external auth service; this
/// record only carries the logical identity and its optional location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub location: Option<GeoPoint>,
    pub created_at: String,
    pub updated_at: String,
}
