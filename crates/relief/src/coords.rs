//! Geographic coordinate types and geodesic helpers
//!
//! Provides the latitude/longitude value type used throughout the pipeline,
//! great-circle distance and destination math, and the square map extent
//! computed around a center point.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean earth radius in meters, matching the sphere the tile provider's
/// tooling uses for distance and destination math.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Geographic coordinate using the WGS84 datum (latitude/longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoord {
    /// Latitude in degrees (-90 to 90, positive = north)
    pub lat: f64,
    /// Longitude in degrees (-180 to 180, positive = east)
    pub lon: f64,
}

impl GeoCoord {
    /// Create a new geographic coordinate
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Check if the coordinate is within valid ranges
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    /// Great-circle distance to another coordinate in meters (haversine)
    pub fn distance_to(&self, other: &GeoCoord) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_M * c
    }

    /// Point reached by travelling `distance_km` from this coordinate along
    /// the given compass bearing (degrees clockwise from north).
    ///
    /// Spherical direct geodesic problem on the [`EARTH_RADIUS_M`] sphere.
    pub fn destination(&self, distance_km: f64, bearing_deg: f64) -> GeoCoord {
        let delta = distance_km * 1000.0 / EARTH_RADIUS_M;
        let theta = bearing_deg.to_radians();
        let lat1 = self.lat.to_radians();
        let lon1 = self.lon.to_radians();

        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
        let lon2 = lon1
            + (theta.sin() * delta.sin() * lat1.cos())
                .atan2(delta.cos() - lat1.sin() * lat2.sin());

        GeoCoord::new(lat2.to_degrees(), lon2.to_degrees())
    }
}

impl Default for GeoCoord {
    fn default() -> Self {
        Self { lat: 0.0, lon: 0.0 }
    }
}

/// Axis-aligned bounding square around a center point
///
/// Invariant: `top_left` is strictly north-west of `bottom_right`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    /// North-west corner
    pub top_left: GeoCoord,
    /// South-east corner
    pub bottom_right: GeoCoord,
}

impl Extent {
    /// Compute the square extent of side `size_km` centered on `center`.
    ///
    /// The corners sit at the ends of the square's diagonal, reached at
    /// bearings -45 and 135 degrees over half the diagonal length.
    pub fn around(center: GeoCoord, size_km: f64) -> Result<Extent> {
        if !(size_km > 0.0) {
            return Err(Error::InvalidExtent(size_km));
        }

        let dist = (2.0 * (size_km / 2.0).powi(2)).sqrt();
        Ok(Extent {
            top_left: center.destination(dist, -45.0),
            bottom_right: center.destination(dist, 135.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_coord_validity() {
        assert!(GeoCoord::new(45.0, -122.0).is_valid());
        assert!(GeoCoord::new(90.0, 180.0).is_valid());
        assert!(!GeoCoord::new(91.0, 0.0).is_valid());
        assert!(!GeoCoord::new(0.0, 181.0).is_valid());
    }

    #[test]
    fn test_geo_coord_distance() {
        let portland = GeoCoord::new(45.5155, -122.6789);
        let seattle = GeoCoord::new(47.6062, -122.3321);

        let distance = portland.distance_to(&seattle);
        // Approximately 233 km
        assert!((distance - 233_000.0).abs() < 5000.0);
    }

    #[test]
    fn test_destination_roundtrip() {
        let start = GeoCoord::new(37.75152, -122.43877);
        let out = start.destination(10.0, 45.0);
        let dist = start.distance_to(&out);
        assert!((dist - 10_000.0).abs() < 1.0);
    }

    #[test]
    fn test_extent_corner_distance() {
        // Corner-to-corner distance must equal size * sqrt(2) for any input.
        for &(lat, lon, size) in &[
            (37.75152, -122.43877, 17.28),
            (60.2, 24.9, 17.28),
            (-33.9, 151.2, 4.0),
        ] {
            let extent = Extent::around(GeoCoord::new(lat, lon), size).unwrap();
            let diagonal = extent.top_left.distance_to(&extent.bottom_right);
            assert!((diagonal - size * 1000.0 * 2.0_f64.sqrt()).abs() < 1.0);
        }
    }

    #[test]
    fn test_extent_orientation() {
        let extent = Extent::around(GeoCoord::new(37.75152, -122.43877), 17.28).unwrap();
        assert!(extent.top_left.lat > extent.bottom_right.lat);
        assert!(extent.top_left.lon < extent.bottom_right.lon);
    }

    #[test]
    fn test_extent_rejects_non_positive_size() {
        let center = GeoCoord::new(37.75152, -122.43877);
        assert!(matches!(
            Extent::around(center, 0.0),
            Err(Error::InvalidExtent(_))
        ));
        assert!(matches!(
            Extent::around(center, -1.0),
            Err(Error::InvalidExtent(_))
        ));
    }
}
