use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Largest latitude Web Mercator can represent
const MAX_LATITUDE: f64 = 85.0511287798;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are finite and within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat >= -90.0
            && self.lat <= 90.0
            && self.lng >= -180.0
            && self.lng <= 180.0
    }

    /// Wraps longitude to [-180, 180] range
    pub fn wrap_lng(lng: f64) -> f64 {
        ((lng + 180.0) % 360.0 + 360.0) % 360.0 - 180.0
    }

    /// Clamps latitude to the range representable in Web Mercator
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }

    /// Projects into the unit Web Mercator square: x and y both in [0, 1],
    /// origin at the north-west corner.
    pub fn to_unit(&self) -> Point {
        Point::new(lng_to_unit_x(self.lng), lat_to_unit_y(self.lat))
    }

    /// Inverse of [`LatLng::to_unit`]
    pub fn from_unit(point: Point) -> Self {
        Self::new(unit_y_to_lat(point.y), unit_x_to_lng(point.x))
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

pub fn lng_to_unit_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

pub fn lat_to_unit_y(lat: f64) -> f64 {
    let sin = lat.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

pub fn unit_x_to_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

pub fn unit_y_to_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

/// Represents a point in screen or projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a bounding box of geographical coordinates
///
/// `south_west.lng > north_east.lng` describes a box that crosses the
/// antimeridian.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    /// Creates bounds in (west, south, east, north) order
    pub fn from_wsen(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self::from_coords(south, west, north, east)
    }

    /// The whole world
    pub fn world() -> Self {
        Self::from_wsen(-180.0, -90.0, 180.0, 90.0)
    }

    pub fn west(&self) -> f64 {
        self.south_west.lng
    }

    pub fn south(&self) -> f64 {
        self.south_west.lat
    }

    pub fn east(&self) -> f64 {
        self.north_east.lng
    }

    pub fn north(&self) -> f64 {
        self.north_east.lat
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west() > self.east()
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &LatLng) -> bool {
        let within_lat = point.lat >= self.south() && point.lat <= self.north();
        let within_lng = if self.crosses_antimeridian() {
            point.lng >= self.west() || point.lng <= self.east()
        } else {
            point.lng >= self.west() && point.lng <= self.east()
        };
        within_lat && within_lng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_creation() {
        let coord = LatLng::new(40.7128, -74.0060);
        assert_eq!(coord.lat, 40.7128);
        assert_eq!(coord.lng, -74.0060);
        assert!(coord.is_valid());
    }

    #[test]
    fn test_non_finite_coordinates_are_invalid() {
        assert!(!LatLng::new(f64::NAN, 10.0).is_valid());
        assert!(!LatLng::new(10.0, f64::INFINITY).is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
    }

    #[test]
    fn test_unit_projection() {
        let origin = LatLng::new(0.0, 0.0).to_unit();
        assert!((origin.x - 0.5).abs() < 1e-12);
        assert!((origin.y - 0.5).abs() < 1e-12);

        let athens = LatLng::new(37.9838, 23.7275);
        let back = LatLng::from_unit(athens.to_unit());
        assert!((back.lat - athens.lat).abs() < 1e-9);
        assert!((back.lng - athens.lng).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_lng() {
        assert_eq!(LatLng::wrap_lng(190.0), -170.0);
        assert_eq!(LatLng::wrap_lng(-190.0), 170.0);
        assert_eq!(LatLng::wrap_lng(45.0), 45.0);
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = LatLngBounds::from_coords(40.0, -75.0, 41.0, -73.0);
        let point_inside = LatLng::new(40.5, -74.0);
        let point_outside = LatLng::new(42.0, -74.0);

        assert!(bounds.contains(&point_inside));
        assert!(!bounds.contains(&point_outside));
    }

    #[test]
    fn test_bounds_across_antimeridian() {
        let bounds = LatLngBounds::from_wsen(170.0, -10.0, -170.0, 10.0);
        assert!(bounds.crosses_antimeridian());
        assert!(bounds.contains(&LatLng::new(0.0, 175.0)));
        assert!(bounds.contains(&LatLng::new(0.0, -175.0)));
        assert!(!bounds.contains(&LatLng::new(0.0, 0.0)));
    }
}
