use serde::{Deserialize, Serialize};
use std::fmt;

/// Zoom used when only the driver position is known.
pub const DRIVER_ONLY_ZOOM: u8 = 14;

/// Fraction of the span added on each side when fitting two points.
pub const BOUNDS_PADDING: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Grid key with three decimals (about 111 m), so nearby fixes share one entry.
    /// Ties round away from zero, as `toFixed(3)` does in the browser widget.
    pub fn grid_key(&self) -> String {
        format!("{:.3},{:.3}", round_milli(self.lat), round_milli(self.lng))
    }

    /// Parses the `/{lat}/{lng}` path pair. Both parts must be finite numbers.
    pub fn parse_pair(lat: &str, lng: &str) -> Option<Self> {
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;
        if lat.is_finite() && lng.is_finite() {
            Some(Self { lat, lng })
        } else {
            None
        }
    }
}

fn round_milli(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MapView {
    Center { center: Coordinate, zoom: u8 },
    FitBounds { south_west: Coordinate, north_east: Coordinate },
}

impl MapView {
    /// Frames the driver, and the destination too when it is known.
    pub fn frame(driver: Coordinate, destination: Option<Coordinate>) -> Self {
        let Some(dest) = destination else {
            return MapView::Center { center: driver, zoom: DRIVER_ONLY_ZOOM };
        };

        let (south, north) = (driver.lat.min(dest.lat), driver.lat.max(dest.lat));
        let (west, east) = (driver.lng.min(dest.lng), driver.lng.max(dest.lng));
        let pad_lat = (north - south) * BOUNDS_PADDING;
        let pad_lng = (east - west) * BOUNDS_PADDING;

        MapView::FitBounds {
            south_west: Coordinate::new(south - pad_lat, west - pad_lng),
            north_east: Coordinate::new(north + pad_lat, east + pad_lng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_key_collapses_beyond_third_decimal() {
        let a = Coordinate::new(-27.46981, 153.02512);
        let b = Coordinate::new(-27.46979, 153.02508);
        assert_eq!(a.grid_key(), "-27.470,153.025");
        assert_eq!(a.grid_key(), b.grid_key());

        let c = Coordinate::new(-27.471, 153.025);
        assert_ne!(a.grid_key(), c.grid_key());
    }

    #[test]
    fn test_grid_key_rounding_edges() {
        // Same up to the third decimal, but on either side of a rounding edge.
        assert_eq!(Coordinate::new(1.2344, 0.0).grid_key(), "1.234,0.000");
        assert_eq!(Coordinate::new(1.2346, 0.0).grid_key(), "1.235,0.000");

        // Exact ties go away from zero.
        assert_eq!(Coordinate::new(-27.0625, 153.0625).grid_key(), "-27.063,153.063");
    }

    #[test]
    fn test_parse_pair_rejects_garbage() {
        assert_eq!(
            Coordinate::parse_pair("-27.47", "153.02"),
            Some(Coordinate::new(-27.47, 153.02))
        );
        assert_eq!(Coordinate::parse_pair("abc", "153.02"), None);
        assert_eq!(Coordinate::parse_pair("-27.47", ""), None);
        assert_eq!(Coordinate::parse_pair("NaN", "1"), None);
    }

    #[test]
    fn test_frame_without_destination_centers_on_driver() {
        let driver = Coordinate::new(-27.5, 153.0);
        assert_eq!(
            MapView::frame(driver, None),
            MapView::Center { center: driver, zoom: 14 }
        );
    }

    #[test]
    fn test_frame_pads_both_points() {
        let driver = Coordinate::new(-27.0, 153.0);
        let dest = Coordinate::new(-28.0, 152.0);
        match MapView::frame(driver, Some(dest)) {
            MapView::FitBounds { south_west, north_east } => {
                assert!((south_west.lat - -28.1).abs() < 1e-9);
                assert!((south_west.lng - 151.9).abs() < 1e-9);
                assert!((north_east.lat - -26.9).abs() < 1e-9);
                assert!((north_east.lng - 153.1).abs() < 1e-9);
            }
            other => panic!("expected bounds, got {:?}", other),
        }
    }
}
