//! Geographic coordinates and the service-region bounding box.

use serde::{Deserialize, Serialize};

/// A WGS84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees, south negative.
    pub lat: f64,
    /// Longitude in degrees, west negative.
    pub lng: f64,
}

impl Coordinates {
    /// Create a coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether the pair is a plausible point on the globe.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A rectangular service region in degrees.
///
/// Deliveries are only priced for coordinates inside this box; everything
/// else is rejected before any distance computation happens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl RegionBounds {
    /// Whether `point` lies inside the region (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Coordinates) -> bool {
        point.is_valid()
            && (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Roughly the Qatar peninsula.
    const BOUNDS: RegionBounds = RegionBounds {
        min_lat: 24.4,
        max_lat: 26.2,
        min_lng: 50.7,
        max_lng: 51.7,
    };

    #[test]
    fn test_contains_inside() {
        assert!(BOUNDS.contains(Coordinates::new(25.2854, 51.5310)));
    }

    #[test]
    fn test_rejects_outside() {
        assert!(!BOUNDS.contains(Coordinates::new(24.0, 51.5)));
        assert!(!BOUNDS.contains(Coordinates::new(25.0, 52.0)));
    }

    #[test]
    fn test_edges_inclusive() {
        assert!(BOUNDS.contains(Coordinates::new(24.4, 50.7)));
        assert!(BOUNDS.contains(Coordinates::new(26.2, 51.7)));
    }

    #[test]
    fn test_rejects_nonsense_coordinates() {
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -181.0).is_valid());
        assert!(!BOUNDS.contains(Coordinates::new(f64::NAN, 51.0)));
    }
}
