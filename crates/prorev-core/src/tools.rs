//! Drawing tools and their settings.

use crate::view::Zoom;
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Default pen width in logical pixels.
pub const DEFAULT_STROKE_WIDTH: f64 = 3.0;
/// Smallest selectable width.
pub const MIN_STROKE_WIDTH: f64 = 1.0;
/// Largest selectable width.
pub const MAX_STROKE_WIDTH: f64 = 20.0;
/// The eraser is this many times wider than the pen.
pub const ERASER_MULTIPLIER: f64 = 5.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Pen,
    /// Paints the background color over existing ink.
    Eraser,
}

impl ToolKind {
    pub fn label(self) -> &'static str {
        match self {
            ToolKind::Pen => "Pen",
            ToolKind::Eraser => "Eraser",
        }
    }
}

/// Current tool settings.
#[derive(Debug, Clone, Copy)]
pub struct DrawingState {
    pub tool: ToolKind,
    pub color: Color,
    stroke_width: f64,
    pub zoom: Zoom,
}

impl Default for DrawingState {
    fn default() -> Self {
        Self {
            tool: ToolKind::Pen,
            color: Color::BLACK,
            stroke_width: DEFAULT_STROKE_WIDTH,
            zoom: Zoom::default(),
        }
    }
}

impl DrawingState {
    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    /// Set the pen width, clamped to `[MIN_STROKE_WIDTH, MAX_STROKE_WIDTH]`.
    pub fn set_stroke_width(&mut self, width: f64) {
        self.stroke_width = width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH);
    }

    /// Width actually painted by the current tool.
    pub fn effective_width(&self) -> f64 {
        match self.tool {
            ToolKind::Pen => self.stroke_width,
            ToolKind::Eraser => self.stroke_width * ERASER_MULTIPLIER,
        }
    }

    /// Color actually painted by the current tool.
    pub fn ink(&self) -> Color {
        match self.tool {
            ToolKind::Pen => self.color,
            ToolKind::Eraser => Color::WHITE,
        }
    }
}
