//! The whiteboard page's state: questions, board and feedback requests.

use crate::board::Snapshot;
use crate::feedback::{Feedback, FeedbackGate, FeedbackTicket};
use crate::input::PointerEvent;
use crate::navigator::QuestionNavigator;
use crate::question::QuestionSet;
use crate::whiteboard::Whiteboard;
use std::fmt::Display;

#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Work to send to the feedback service.
#[derive(Debug, Clone)]
pub struct FeedbackRequest {
    pub ticket: FeedbackTicket,
    pub snapshot: Snapshot,
    /// Title of the question being worked on.
    pub problem_context: String,
}

/// What happened to a feedback response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackOutcome {
    Shown,
    /// The user moved to another question or cleared the board.
    Stale,
    /// The user had started drawing again.
    DiscardedWhileDrawing,
}

pub struct TutorSession {
    navigator: QuestionNavigator,
    whiteboard: Whiteboard,
    gate: FeedbackGate,
}

impl TutorSession {
    pub fn new(questions: QuestionSet, whiteboard: Whiteboard) -> Self {
        Self {
            navigator: QuestionNavigator::from_set(questions),
            whiteboard,
            gate: FeedbackGate::new(),
        }
    }

    pub fn navigator(&self) -> &QuestionNavigator {
        &self.navigator
    }

    pub fn whiteboard(&self) -> &Whiteboard {
        &self.whiteboard
    }

    pub fn whiteboard_mut(&mut self) -> &mut Whiteboard {
        &mut self.whiteboard
    }

    pub fn is_loading_feedback(&self) -> bool {
        self.gate.is_loading()
    }

    pub fn next(&mut self, now: Instant) -> bool {
        let changed = self.navigator.next(now);
        if changed {
            self.on_question_changed();
        }
        changed
    }

    pub fn previous(&mut self, now: Instant) -> bool {
        let changed = self.navigator.previous(now);
        if changed {
            self.on_question_changed();
        }
        changed
    }

    fn on_question_changed(&mut self) {
        self.whiteboard.reset();
        self.gate.invalidate();
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) {
        self.whiteboard.handle_pointer(event, now);
    }

    /// Wipe the board. A response still in flight is for work that no
    /// longer exists, so it will be dropped.
    pub fn clear_board(&mut self) {
        self.whiteboard.clear();
        self.gate.invalidate();
    }

    /// Advance timers. Returns a request when the drawing pause elapsed and
    /// no other request is outstanding.
    pub fn poll(&mut self, now: Instant) -> Option<FeedbackRequest> {
        self.navigator.poll(now);
        if !self.whiteboard.poll_timer(now) {
            return None;
        }
        let problem_context = self.navigator.current()?.title.clone();
        let Some(ticket) = self.gate.begin() else {
            log::debug!("Feedback already in flight, skipping");
            return None;
        };
        Some(FeedbackRequest {
            ticket,
            snapshot: self.whiteboard.snapshot(),
            problem_context,
        })
    }

    /// Earliest instant at which [`poll`](Self::poll) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.navigator.next_deadline(), self.whiteboard.timer_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Deliver the result of a feedback request. Failures are shown as the
    /// fallback message.
    pub fn complete<E: Display>(
        &mut self,
        ticket: FeedbackTicket,
        result: Result<Feedback, E>,
    ) -> FeedbackOutcome {
        if !self.gate.finish(ticket) {
            log::debug!("Dropping feedback for an abandoned request");
            return FeedbackOutcome::Stale;
        }
        let feedback = result.unwrap_or_else(|e| {
            log::warn!("Feedback request failed: {}", e);
            Feedback::fallback()
        });
        if self.whiteboard.is_drawing() {
            return FeedbackOutcome::DiscardedWhileDrawing;
        }
        self.whiteboard.show_feedback(feedback);
        FeedbackOutcome::Shown
    }
}
