use glam::DVec2;
use std::f64::consts::PI;

use crate::model::LatLng;

/// Width of the whole world in braille pixels at zoom level 0
pub const WORLD_PX: f64 = 64.0;
/// Equatorial circumference in meters
const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 18.0;

/// Viewport representing the visible map area and zoom level.
/// Zoom follows slippy-map semantics: each level doubles the scale.
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon: wrap_lon(center_lon),
            center_lat: center_lat.clamp(-85.0, 85.0),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Viewport centered on a point at the given zoom
    pub fn centered(center: LatLng, zoom: f64, width: usize, height: usize) -> Self {
        Self::new(center.lng, center.lat, zoom, width, height)
    }

    /// Pixels spanned by the whole world at the current zoom
    #[inline]
    pub fn scale(&self) -> f64 {
        WORLD_PX * 2f64.powf(self.zoom)
    }

    /// Recenter without touching zoom bounds beyond clamping
    pub fn center_on(&mut self, center: LatLng, zoom: f64) {
        self.center_lon = wrap_lon(center.lng);
        self.center_lat = center.lat.clamp(-85.0, 85.0);
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(self.center_lat, self.center_lon)
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let c = mercator(self.center_lon, self.center_lat);
        let moved = c + DVec2::new(dx as f64, dy as f64) / self.scale();
        let (lon, lat) = inverse_mercator(moved);
        self.center_lon = wrap_lon(lon);
        self.center_lat = lat.clamp(-85.0, 85.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1.0).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - 1.0).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, -1.0);
    }

    fn zoom_at(&mut self, px: i32, py: i32, step: f64) {
        // Keep the point under the cursor fixed
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom + step).clamp(MIN_ZOOM, MAX_ZOOM);
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let p = self.project_f(lon, lat);
        (p.x.round() as i32, p.y.round() as i32)
    }

    fn project_f(&self, lon: f64, lat: f64) -> DVec2 {
        let offset = (mercator(lon, lat) - mercator(self.center_lon, self.center_lat)) * self.scale();
        offset + DVec2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let screen = DVec2::new(px as f64 - self.width as f64 / 2.0, py as f64 - self.height as f64 / 2.0);
        inverse_mercator(mercator(self.center_lon, self.center_lat) + screen / self.scale())
    }

    /// Convert a ground distance at a latitude into braille pixels
    pub fn meters_to_pixels(&self, meters: f64, lat: f64) -> f64 {
        let meters_per_px = EARTH_CIRCUMFERENCE_M * lat.to_radians().cos().abs().max(1e-6) / self.scale();
        meters / meters_per_px
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Check if a circle might overlap the viewport
    pub fn circle_might_be_visible(&self, px: i32, py: i32, radius: i32) -> bool {
        let (px, py, radius) = (i64::from(px), i64::from(py), i64::from(radius));
        px + radius >= 0
            && px - radius < self.width as i64
            && py + radius >= 0
            && py - radius < self.height as i64
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

/// Web Mercator normalized coordinates, both axes in [0, 1]
#[inline]
fn mercator(lon: f64, lat: f64) -> DVec2 {
    let x = (lon + 180.0) / 360.0;
    let lat_rad = lat.clamp(-85.0511, 85.0511).to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    DVec2::new(x, y)
}

#[inline]
fn inverse_mercator(p: DVec2) -> (f64, f64) {
    let lon = p.x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * p.y)).sinh().atan().to_degrees();
    (lon, lat)
}

fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        assert_eq!(vp.project(0.0, 0.0), (50, 50));
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 2.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
        vp.pan(0, 10);
        assert!(vp.center_lat < 0.0);
    }

    #[test]
    fn test_unproject_round_trip() {
        let vp = Viewport::new(-122.4, 37.7, 6.0, 200, 120);
        let (px, py) = vp.project(-121.0, 38.5);
        let (lon, lat) = vp.unproject(px, py);
        assert!((lon + 121.0).abs() < 0.05);
        assert!((lat - 38.5).abs() < 0.05);
    }

    #[test]
    fn test_meters_to_pixels_doubles_per_zoom_level() {
        let a = Viewport::new(0.0, 37.0, 6.0, 100, 100);
        let b = Viewport::new(0.0, 37.0, 7.0, 100, 100);
        let ra = a.meters_to_pixels(50_000.0, 37.0);
        let rb = b.meters_to_pixels(50_000.0, 37.0);
        assert!((rb / ra - 2.0).abs() < 1e-9);
        assert!(ra > 1.0);
    }

    #[test]
    fn test_center_on_clamps_zoom() {
        let mut vp = Viewport::new(0.0, 0.0, 3.0, 100, 100);
        vp.center_on(LatLng::new(34.05, -118.25), 40.0);
        assert_eq!(vp.zoom, MAX_ZOOM);
        assert_eq!(vp.center(), LatLng::new(34.05, -118.25));
    }

    #[test]
    fn test_new_wraps_longitude() {
        let vp = Viewport::new(200.0, 0.0, 3.0, 100, 100);
        assert!((vp.center_lon + 160.0).abs() < 1e-9);
        let vp = Viewport::centered(LatLng::new(10.0, -190.0), 3.0, 100, 100);
        assert!((vp.center_lon - 170.0).abs() < 1e-9);
    }

    #[test]
    fn test_circle_visibility_with_extreme_radius() {
        let vp = Viewport::new(0.0, 0.0, 3.0, 100, 100);
        assert!(vp.circle_might_be_visible(i32::MAX - 5, 50, i32::MAX));
        assert!(!vp.circle_might_be_visible(i32::MIN, i32::MIN, 10));
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let mut vp = Viewport::new(-100.0, 40.0, 4.0, 200, 100);
        let (lon, lat) = vp.unproject(150, 30);
        vp.zoom_in_at(150, 30);
        let (px, py) = vp.project(lon, lat);
        assert!((px - 150).abs() <= 1);
        assert!((py - 30).abs() <= 1);
    }
}
