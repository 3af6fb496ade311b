//! Renderer trait abstraction.

use kurbo::{Point, Rect, Size};
use peniko::Color;
use prorev_core::Whiteboard;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Where the whiteboard sits in the window, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoardLayout {
    pub origin: Point,
    pub size: Size,
}

impl BoardLayout {
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.origin, self.size)
    }

    pub fn contains(&self, window_point: Point) -> bool {
        self.rect().contains(window_point)
    }

    /// Window position to a position relative to the board's top-left corner.
    pub fn to_local(&self, window_point: Point) -> Point {
        Point::new(window_point.x - self.origin.x, window_point.y - self.origin.y)
    }
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    pub whiteboard: &'a Whiteboard,
    pub layout: BoardLayout,
    /// Viewport size in physical pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Window color around the board.
    pub background_color: Color,
    pub border_color: Color,
    /// Pointer position relative to the board, for the tool outline.
    pub cursor: Option<Point>,
}

impl<'a> RenderContext<'a> {
    pub fn new(whiteboard: &'a Whiteboard, layout: BoardLayout, viewport_size: Size) -> Self {
        Self {
            whiteboard,
            layout,
            viewport_size,
            scale_factor: 1.0,
            background_color: Color::from_rgba8(243, 244, 246, 255), // Gray-100
            border_color: Color::from_rgba8(209, 213, 219, 255),     // Gray-300
            cursor: None,
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_cursor(mut self, cursor: Option<Point>) -> Self {
        self.cursor = cursor;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Build the scene for a frame.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_to_local() {
        let layout = BoardLayout::new(Point::new(100.0, 40.0), Size::new(600.0, 400.0));
        assert_eq!(layout.to_local(Point::new(150.0, 50.0)), Point::new(50.0, 10.0));
        assert!(layout.contains(Point::new(100.0, 40.0)));
        assert!(!layout.contains(Point::new(99.0, 40.0)));
        assert!(!layout.contains(Point::new(700.0, 200.0)));
    }
}
