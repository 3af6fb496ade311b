//! The drawing surface: bitmap, tool settings, stroke state and the
//! quiet-period timer that triggers feedback.

use crate::board::{Bitmap, Snapshot};
use crate::debounce::Debounce;
use crate::feedback::Feedback;
use crate::input::PointerEvent;
use crate::tools::DrawingState;
use kurbo::{Point, Size};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

/// Whether a stroke is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StrokeState {
    #[default]
    Idle,
    /// `last` is the previous point in board coordinates.
    Drawing { last: Point },
}

/// Whiteboard with its feedback overlay.
///
/// Invariants:
/// - starting a stroke hides any displayed feedback and cancels the timer;
/// - every movement while drawing cancels the timer;
/// - ending a stroke arms the timer only when no feedback is displayed.
#[derive(Debug, Clone)]
pub struct Whiteboard {
    bitmap: Bitmap,
    logical_size: Size,
    pixels_per_point: f64,
    pub drawing: DrawingState,
    stroke: StrokeState,
    timer: Debounce,
    feedback: Option<Feedback>,
}

impl Whiteboard {
    /// Create a white board of `logical_size` points at the given pixel density.
    pub fn new(logical_size: Size, pixels_per_point: f64) -> Self {
        let (w, h) = physical_size(logical_size, pixels_per_point);
        Self {
            bitmap: Bitmap::new(w, h),
            logical_size,
            pixels_per_point,
            drawing: DrawingState::default(),
            stroke: StrokeState::Idle,
            timer: Debounce::default(),
            feedback: None,
        }
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn logical_size(&self) -> Size {
        self.logical_size
    }

    pub fn pixels_per_point(&self) -> f64 {
        self.pixels_per_point
    }

    pub fn set_feedback_delay(&mut self, delay: Duration) {
        self.timer.set_delay(delay);
    }

    /// Match a new on-screen size. The drawing is discarded when the pixel
    /// dimensions change.
    pub fn resize(&mut self, logical_size: Size, pixels_per_point: f64) {
        self.logical_size = logical_size;
        self.pixels_per_point = pixels_per_point;
        let (w, h) = physical_size(logical_size, pixels_per_point);
        if (w, h) != (self.bitmap.width(), self.bitmap.height()) {
            log::debug!("Whiteboard resized to {}x{} px, drawing cleared", w, h);
            self.bitmap.resize(w, h);
            self.stroke = StrokeState::Idle;
        }
    }

    pub fn stroke_state(&self) -> StrokeState {
        self.stroke
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.stroke, StrokeState::Drawing { .. })
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn show_feedback(&mut self, feedback: Feedback) {
        self.feedback = Some(feedback);
    }

    pub fn dismiss_feedback(&mut self) {
        self.feedback = None;
    }

    pub fn timer_pending(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn timer_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Apply a pointer event. `now` is used to arm the feedback timer.
    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) {
        match event {
            PointerEvent::Down { position, .. } => {
                self.feedback = None;
                self.timer.cancel();
                self.stroke = StrokeState::Drawing {
                    last: self.drawing.zoom.screen_to_board(position),
                };
            }
            PointerEvent::Move { position } => {
                if let StrokeState::Drawing { last } = self.stroke {
                    let point = self.drawing.zoom.screen_to_board(position);
                    self.paint(last, point);
                    self.stroke = StrokeState::Drawing { last: point };
                    self.timer.cancel();
                }
            }
            PointerEvent::Up { .. } | PointerEvent::Leave => {
                if self.is_drawing() {
                    self.stroke = StrokeState::Idle;
                    if self.feedback.is_none() {
                        self.timer.start(now);
                    }
                }
            }
        }
    }

    fn paint(&mut self, from: Point, to: Point) {
        let ppp = self.pixels_per_point;
        let scale = |p: Point| Point::new(p.x * ppp, p.y * ppp);
        self.bitmap.stroke_segment(
            scale(from),
            scale(to),
            self.drawing.effective_width() * ppp,
            self.drawing.ink(),
        );
    }

    /// Whether the quiet period elapsed. Never fires mid-stroke.
    pub fn poll_timer(&mut self, now: Instant) -> bool {
        if self.is_drawing() {
            return false;
        }
        self.timer.poll(now)
    }

    /// Wipe the drawing and hide feedback.
    pub fn clear(&mut self) {
        self.bitmap.clear();
        self.feedback = None;
        self.timer.cancel();
    }

    /// Return to a fresh board, as when switching questions.
    pub fn reset(&mut self) {
        self.clear();
        self.stroke = StrokeState::Idle;
    }

    pub fn snapshot(&self) -> Snapshot {
        self.bitmap.snapshot()
    }
}

fn physical_size(logical: Size, pixels_per_point: f64) -> (u32, u32) {
    (
        (logical.width * pixels_per_point).round().max(0.0) as u32,
        (logical.height * pixels_per_point).round().max(0.0) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PointerSource;
    use crate::tools::ToolKind;

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down { position: Point::new(x, y), source: PointerSource::Mouse }
    }

    fn mv(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move { position: Point::new(x, y) }
    }

    fn up(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Up { position: Point::new(x, y) }
    }

    fn board() -> Whiteboard {
        Whiteboard::new(Size::new(100.0, 50.0), 2.0)
    }

    #[test]
    fn test_bitmap_uses_physical_pixels() {
        let wb = board();
        assert_eq!((wb.bitmap().width(), wb.bitmap().height()), (200, 100));
    }

    #[test]
    fn test_stroke_paints_and_arms_timer() {
        let now = Instant::now();
        let mut wb = board();
        wb.handle_pointer(down(10.0, 25.0), now);
        assert!(wb.is_drawing());
        wb.handle_pointer(mv(60.0, 25.0), now);
        wb.handle_pointer(up(60.0, 25.0), now);

        assert!(!wb.is_drawing());
        assert_eq!(wb.bitmap().pixel(70, 50), Some([0, 0, 0, 255]));
        assert!(wb.timer_pending());
        assert!(!wb.poll_timer(now + Duration::from_millis(1000)));
        assert!(wb.poll_timer(now + Duration::from_millis(1500)));
    }

    #[test]
    fn test_down_clears_feedback_and_cancels_timer() {
        let now = Instant::now();
        let mut wb = board();
        wb.handle_pointer(down(1.0, 1.0), now);
        wb.handle_pointer(up(1.0, 1.0), now);
        assert!(wb.timer_pending());

        wb.show_feedback(Feedback::new(true, "Nice"));
        wb.handle_pointer(down(5.0, 5.0), now);
        assert!(wb.feedback().is_none());
        assert!(!wb.timer_pending());
    }

    #[test]
    fn test_ending_stroke_with_feedback_shown_does_not_arm() {
        let now = Instant::now();
        let mut wb = board();
        wb.handle_pointer(down(1.0, 1.0), now);
        wb.show_feedback(Feedback::new(false, "Check the sign"));
        wb.handle_pointer(up(1.0, 1.0), now);
        assert!(!wb.timer_pending());
        assert!(wb.feedback().is_some());
    }

    #[test]
    fn test_move_without_down_does_nothing() {
        let now = Instant::now();
        let mut wb = board();
        wb.handle_pointer(mv(10.0, 10.0), now);
        wb.handle_pointer(up(10.0, 10.0), now);
        assert!(wb.bitmap().is_blank());
        assert!(!wb.timer_pending());
    }

    #[test]
    fn test_zoom_divides_pointer_positions() {
        let now = Instant::now();
        let mut wb = board();
        wb.drawing.zoom.set_level(2.0);
        wb.handle_pointer(down(20.0, 20.0), now);
        wb.handle_pointer(mv(80.0, 20.0), now);
        // Screen y=20 at 2x zoom is board y=10, physical y=20.
        assert_eq!(wb.bitmap().pixel(40, 19), Some([0, 0, 0, 255]));
        assert_eq!(wb.bitmap().pixel(40, 39), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_eraser_restores_background() {
        let now = Instant::now();
        let mut wb = board();
        wb.handle_pointer(down(10.0, 25.0), now);
        wb.handle_pointer(mv(90.0, 25.0), now);
        wb.handle_pointer(up(90.0, 25.0), now);

        wb.drawing.tool = ToolKind::Eraser;
        wb.handle_pointer(down(0.0, 25.0), now);
        wb.handle_pointer(mv(100.0, 25.0), now);
        wb.handle_pointer(up(100.0, 25.0), now);
        assert!(wb.bitmap().is_blank());
    }

    #[test]
    fn test_timer_does_not_fire_mid_stroke() {
        let now = Instant::now();
        let mut wb = board();
        wb.handle_pointer(down(1.0, 1.0), now);
        wb.handle_pointer(up(1.0, 1.0), now);
        wb.handle_pointer(down(2.0, 2.0), now + Duration::from_millis(100));
        assert!(!wb.poll_timer(now + Duration::from_secs(5)));
    }

    #[test]
    fn test_resize_discards_drawing() {
        let now = Instant::now();
        let mut wb = board();
        wb.handle_pointer(down(10.0, 25.0), now);
        wb.handle_pointer(mv(60.0, 25.0), now);
        wb.resize(Size::new(120.0, 50.0), 2.0);
        assert!(wb.bitmap().is_blank());
        assert!(!wb.is_drawing());
    }

    #[test]
    fn test_clear_hides_feedback() {
        let mut wb = board();
        wb.show_feedback(Feedback::fallback());
        wb.clear();
        assert!(wb.feedback().is_none());
    }
}
