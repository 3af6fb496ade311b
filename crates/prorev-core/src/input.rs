//! Pointer events for the whiteboard.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PointerSource {
    #[default]
    Mouse,
    Touch,
}

/// Unified mouse/touch event. Positions are logical pixels relative to the
/// top-left corner of the on-screen board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, source: PointerSource },
    Move { position: Point },
    Up { position: Point },
    /// The pointer left the board or the touch was cancelled.
    Leave,
}

impl PointerEvent {
    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position } => Some(*position),
            PointerEvent::Leave => None,
        }
    }
}
