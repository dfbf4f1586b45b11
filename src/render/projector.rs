use crate::geo::Coordinates;

use super::svg::Point;

const EPSILON: f64 = 1e-6;

fn is_zero(value: f64) -> bool {
    value.abs() < EPSILON
}

/// Maps coordinates onto a `width` x `height` canvas, keeping `padding` free
/// on every side. Both axes share one zoom factor, so shapes keep their
/// proportions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereProjector {
    padding: f64,
    min_lng: f64,
    max_lat: f64,
    zoom: f64,
}

impl SphereProjector {
    pub fn new(points: &[Coordinates], width: f64, height: f64, padding: f64) -> Self {
        let Some(first) = points.first() else {
            return Self {
                padding,
                min_lng: 0.0,
                max_lat: 0.0,
                zoom: 0.0,
            };
        };
        let (mut min_lng, mut max_lng) = (first.lng, first.lng);
        let (mut min_lat, mut max_lat) = (first.lat, first.lat);
        for point in points {
            min_lng = min_lng.min(point.lng);
            max_lng = max_lng.max(point.lng);
            min_lat = min_lat.min(point.lat);
            max_lat = max_lat.max(point.lat);
        }

        let width_zoom =
            (!is_zero(max_lng - min_lng)).then(|| (width - 2.0 * padding) / (max_lng - min_lng));
        let height_zoom =
            (!is_zero(max_lat - min_lat)).then(|| (height - 2.0 * padding) / (max_lat - min_lat));
        let zoom = match (width_zoom, height_zoom) {
            (Some(w), Some(h)) => w.min(h),
            (Some(zoom), None) | (None, Some(zoom)) => zoom,
            (None, None) => 0.0,
        };

        Self {
            padding,
            min_lng,
            max_lat,
            zoom,
        }
    }

    pub fn project(&self, coords: Coordinates) -> Point {
        Point {
            x: (coords.lng - self.min_lng) * self.zoom + self.padding,
            y: (self.max_lat - coords.lat) * self.zoom + self.padding,
        }
    }
}
