use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Great-circle distance in meters.
pub fn compute_distance(from: Coordinates, to: Coordinates) -> f64 {
    if from == to {
        return 0.0;
    }
    let dr = std::f64::consts::PI / 180.0;
    let cos_angle = (from.lat * dr).sin() * (to.lat * dr).sin()
        + (from.lat * dr).cos() * (to.lat * dr).cos() * ((from.lng - to.lng).abs() * dr).cos();
    // Rounding can push the cosine slightly out of [-1, 1].
    cos_angle.clamp(-1.0, 1.0).acos() * EARTH_RADIUS
}
