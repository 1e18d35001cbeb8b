//! Coordinates and the small slice of GeoJSON the dashboard map consumes.
//!
//! All coordinates are `[longitude, latitude]` pairs in degrees. Distances are
//! measured in degree space, which is adequate for the few kilometres the
//! event area spans.

use std::f64::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tolerance for disk membership after floating point round-off.
const DISK_EPSILON: f64 = 1e-12;

/// A `[lon, lat]` pair, serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat(pub f64, pub f64);

impl LonLat {
    pub fn lon(&self) -> f64 {
        self.0
    }

    pub fn lat(&self) -> f64 {
        self.1
    }

    /// Euclidean distance to `other` in degrees.
    pub fn distance_to(&self, other: &LonLat) -> f64 {
        (self.0 - other.0).hypot(self.1 - other.1)
    }
}

/// Sample a point uniformly inside the disk of `radius` around `center`.
///
/// Uses `r = radius * sqrt(u)` so that points are not bunched at the centre.
pub fn random_point_in_disk<R: Rng + ?Sized>(rng: &mut R, center: LonLat, radius: f64) -> LonLat {
    let r = radius * rng.random::<f64>().sqrt();
    let theta = rng.random::<f64>() * 2.0 * PI;
    LonLat(center.0 + r * theta.cos(), center.1 + r * theta.sin())
}

/// Whether `point` lies within `radius` of `center`.
pub fn disk_contains(center: LonLat, radius: f64, point: LonLat) -> bool {
    center.distance_to(&point) <= radius + DISK_EPSILON
}

/// Nudge a point by up to `magnitude / 2` on each axis.
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, point: LonLat, magnitude: f64) -> LonLat {
    LonLat(
        point.0 + (rng.random::<f64>() - 0.5) * magnitude,
        point.1 + (rng.random::<f64>() - 0.5) * magnitude,
    )
}

/// GeoJSON polygon geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Polygon")]
pub struct Polygon {
    /// Linear rings; the first is the outer boundary.
    pub coordinates: Vec<Vec<LonLat>>,
}

impl Polygon {
    /// Build a single-ring polygon, closing the ring if the caller did not.
    pub fn from_ring(mut ring: Vec<LonLat>) -> Self {
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        Self {
            coordinates: vec![ring],
        }
    }

    /// True when every ring starts and ends on the same coordinate.
    pub fn is_closed(&self) -> bool {
        self.coordinates
            .iter()
            .all(|ring| ring.len() >= 4 && ring.first() == ring.last())
    }
}

/// GeoJSON point geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Point")]
pub struct Point {
    pub coordinates: LonLat,
}

/// Empty property bag for features that carry only a position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoProperties {}

/// A GeoJSON feature wrapping a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct PointFeature {
    pub properties: NoProperties,
    pub geometry: Point,
}

impl PointFeature {
    pub fn at(coordinates: LonLat) -> Self {
        Self {
            properties: NoProperties {},
            geometry: Point { coordinates },
        }
    }
}

/// A GeoJSON feature collection of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<PointFeature>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const CENTER: LonLat = LonLat(75.7772, 23.1825);

    #[test]
    fn test_random_points_stay_in_disk() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let p = random_point_in_disk(&mut rng, CENTER, 0.02);
            assert!(disk_contains(CENTER, 0.02, p), "{p:?} outside disk");
        }
    }

    #[test]
    fn test_disk_contains_rejects_far_point() {
        assert!(!disk_contains(CENTER, 0.02, LonLat(75.80, 23.1825)));
        assert!(disk_contains(CENTER, 0.02, CENTER));
    }

    #[test]
    fn test_jitter_is_bounded() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let moved = jitter(&mut rng, CENTER, 0.00015);
            assert!((moved.lon() - CENTER.lon()).abs() <= 0.000075);
            assert!((moved.lat() - CENTER.lat()).abs() <= 0.000075);
        }
    }

    #[test]
    fn test_polygon_from_ring_closes() {
        let polygon = Polygon::from_ring(vec![
            LonLat(0.0, 0.0),
            LonLat(1.0, 0.0),
            LonLat(1.0, 1.0),
        ]);
        assert!(polygon.is_closed());
        assert_eq!(polygon.coordinates[0].len(), 4);
    }

    #[test]
    fn test_geojson_shape() {
        let collection = FeatureCollection {
            features: vec![PointFeature::at(LonLat(1.5, 2.5))],
        };
        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["geometry"]["type"], "Point");
        assert_eq!(
            value["features"][0]["geometry"]["coordinates"],
            serde_json::json!([1.5, 2.5])
        );
        assert_eq!(value["features"][0]["properties"], serde_json::json!({}));
    }
}
