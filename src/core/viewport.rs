use crate::constants::{MAX_SUPPORTED_ZOOM, TILE_SIZE};
use crate::core::geo::{LatLng, LatLngBounds, Point};
use serde::{Deserialize, Serialize};

/// The query-facing view of the map: visible bounding box plus zoom level.
///
/// Transient and owned by the map surface; read-only input to the viewport
/// query engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub bounds: LatLngBounds,
    pub zoom: f64,
}

impl ViewportState {
    pub fn new(bounds: LatLngBounds, zoom: f64) -> Self {
        Self { bounds, zoom }
    }

    /// Integer zoom tier used for index queries
    pub fn zoom_tier(&self) -> u8 {
        zoom_tier(self.zoom)
    }
}

/// Floors a fractional zoom to its integer tier
pub fn zoom_tier(zoom: f64) -> u8 {
    if !zoom.is_finite() || zoom <= 0.0 {
        return 0;
    }
    zoom.floor().min(MAX_SUPPORTED_ZOOM as f64) as u8
}

/// Camera model of a map view: center, zoom and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center: Self::clamp_center(center),
            zoom: zoom.clamp(0.0, MAX_SUPPORTED_ZOOM as f64),
            size,
            min_zoom: 0.0,
            max_zoom: MAX_SUPPORTED_ZOOM as f64,
        }
    }

    /// Sets the center of the viewport
    pub fn set_center(&mut self, center: LatLng) {
        self.center = Self::clamp_center(center);
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    /// Gets the scale factor for the current zoom level
    pub fn scale(&self) -> f64 {
        2_f64.powf(self.zoom)
    }

    /// Projects a LatLng to world pixel coordinates at the given zoom level
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let z = zoom.unwrap_or(self.zoom);
        let world_size = TILE_SIZE as f64 * 2_f64.powf(z);
        lat_lng.to_unit().multiply(world_size)
    }

    /// Unprojects world pixel coordinates back to LatLng at the given zoom level
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let z = zoom.unwrap_or(self.zoom);
        let world_size = TILE_SIZE as f64 * 2_f64.powf(z);
        LatLng::from_unit(pixel.multiply(1.0 / world_size))
    }

    /// Converts a geographical coordinate to screen pixel coordinates (container relative)
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let origin = self.top_left_world_pixel();
        self.project(lat_lng, None).subtract(&origin)
    }

    /// Converts screen pixel coordinates back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let origin = self.top_left_world_pixel();
        self.unproject(&pixel.add(&origin), None)
    }

    fn top_left_world_pixel(&self) -> Point {
        let center = self.project(&self.center, None);
        center.subtract(&Point::new(self.size.x / 2.0, self.size.y / 2.0))
    }

    /// Gets the current viewport bounds in geographical coordinates.
    ///
    /// Longitudes are wrapped, so a view straddling the antimeridian yields
    /// bounds with `west > east`; a view wider than the world yields the full
    /// longitude range.
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&Point::new(self.size.x, self.size.y));

        let (west, east) = if se.lng - nw.lng >= 360.0 {
            (-180.0, 180.0)
        } else {
            let west = LatLng::wrap_lng(nw.lng);
            let mut east = LatLng::wrap_lng(se.lng);
            if east == -180.0 && se.lng > nw.lng {
                east = 180.0;
            }
            (west, east)
        };

        LatLngBounds::from_wsen(west, se.lat.max(-90.0), east, nw.lat.min(90.0))
    }

    /// Snapshot for the viewport query engine
    pub fn state(&self) -> ViewportState {
        ViewportState::new(self.bounds(), self.zoom)
    }

    /// Clamps center to the Web Mercator world
    fn clamp_center(center: LatLng) -> LatLng {
        LatLng::new(LatLng::clamp_lat(center.lat), center.lng.clamp(-180.0, 180.0))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(800.0, 600.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_creation() {
        let viewport = Viewport::new(
            LatLng::new(40.7128, -74.0060),
            10.0,
            Point::new(800.0, 600.0),
        );

        assert_eq!(viewport.zoom, 10.0);
        assert_eq!(viewport.center.lat, 40.7128);
        assert_eq!(viewport.size.x, 800.0);
    }

    #[test]
    fn test_coordinate_conversion() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 1.0, Point::new(512.0, 512.0));

        let center_pixel = Point::new(256.0, 256.0);
        let center_lat_lng = viewport.pixel_to_lat_lng(&center_pixel);

        assert!((center_lat_lng.lat - 0.0).abs() < 0.01);
        assert!((center_lat_lng.lng - 0.0).abs() < 0.01);

        let back = viewport.lat_lng_to_pixel(&center_lat_lng);
        assert!((back.x - 256.0).abs() < 1e-6);
        assert!((back.y - 256.0).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_limits() {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(2.0, 15.0);

        viewport.set_zoom(1.0);
        assert_eq!(viewport.zoom, 2.0);

        viewport.set_zoom(20.0);
        assert_eq!(viewport.zoom, 15.0);
    }

    #[test]
    fn test_bounds_contain_center() {
        let center = LatLng::new(37.98, 23.72);
        let viewport = Viewport::new(center, 12.0, Point::new(800.0, 600.0));
        let bounds = viewport.bounds();

        assert!(bounds.contains(&center));
        assert!(bounds.west() < bounds.east());
        assert!(bounds.south() < bounds.north());
    }

    #[test]
    fn test_world_view_covers_all_longitudes() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 0.0, Point::new(1024.0, 512.0));
        let bounds = viewport.bounds();
        assert_eq!(bounds.west(), -180.0);
        assert_eq!(bounds.east(), 180.0);
    }

    #[test]
    fn test_zoom_tier_floors() {
        assert_eq!(zoom_tier(11.7), 11);
        assert_eq!(zoom_tier(-3.0), 0);
        assert_eq!(zoom_tier(f64::NAN), 0);
        let state = ViewportState::new(LatLngBounds::world(), 4.99);
        assert_eq!(state.zoom_tier(), 4);
    }
}
