//! Zoom transform between the on-screen board and its bitmap.

use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};

/// Smallest zoom level.
pub const MIN_ZOOM: f64 = 0.5;
/// Largest zoom level.
pub const MAX_ZOOM: f64 = 3.0;
/// Multiplier applied by one zoom step.
pub const ZOOM_STEP: f64 = 1.1;

/// Display magnification of the whiteboard.
///
/// Only the presentation is scaled; the bitmap keeps its resolution, so
/// pointer positions are divided by the zoom before painting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zoom {
    level: f64,
}

impl Default for Zoom {
    fn default() -> Self {
        Self { level: 1.0 }
    }
}

impl Zoom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Set the level, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn set_level(&mut self, level: f64) {
        self.level = level.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_in(&mut self) {
        self.set_level(self.level * ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_level(self.level / ZOOM_STEP);
    }

    pub fn reset(&mut self) {
        self.level = 1.0;
    }

    /// Level as a whole percentage, for display.
    pub fn percent(&self) -> u32 {
        (self.level * 100.0).round() as u32
    }

    /// Board-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.level)
    }

    /// Convert a screen point (relative to the board origin) to board coordinates.
    pub fn screen_to_board(&self, screen_point: Point) -> Point {
        Point::new(screen_point.x / self.level, screen_point.y / self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_zoom() {
        let zoom = Zoom::new();
        assert!((zoom.level() - 1.0).abs() < f64::EPSILON);
        assert_eq!(zoom.percent(), 100);
    }

    #[test]
    fn test_zoom_steps() {
        let mut zoom = Zoom::new();
        zoom.zoom_in();
        assert!((zoom.level() - 1.1).abs() < 1e-10);
        zoom.zoom_out();
        assert!((zoom.level() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut zoom = Zoom::new();
        for _ in 0..50 {
            zoom.zoom_in();
        }
        assert!((zoom.level() - MAX_ZOOM).abs() < f64::EPSILON);

        for _ in 0..100 {
            zoom.zoom_out();
        }
        assert!((zoom.level() - MIN_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_board_with_zoom() {
        let mut zoom = Zoom::new();
        zoom.set_level(2.0);
        let board = zoom.screen_to_board(Point::new(100.0, 200.0));
        assert!((board.x - 50.0).abs() < f64::EPSILON);
        assert!((board.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut zoom = Zoom::new();
        zoom.set_level(1.5);
        let original = Point::new(123.0, 456.0);
        let back = zoom.transform() * zoom.screen_to_board(original);
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }
}
