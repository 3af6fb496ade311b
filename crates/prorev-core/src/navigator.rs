//! Ordered question list with a bounded cursor.

use crate::question::{Question, QuestionSet, Suggestion};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

/// Delay between switching questions and showing the new hints.
pub const SUGGESTION_DELAY: Duration = Duration::from_millis(500);

/// Position of the cursor, 1-based for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    /// Fraction of the way through the list, in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f32 / self.total as f32
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingLoad {
    index: usize,
    due: Instant,
}

/// Holds the questions and which one is current.
///
/// Moving the cursor hides the sidebar hints and schedules them to reappear
/// after [`SUGGESTION_DELAY`]. Moving again before that replaces the
/// scheduled load, so hints of a question the user skipped past never show.
#[derive(Debug, Clone, Default)]
pub struct QuestionNavigator {
    questions: Vec<Question>,
    current: usize,
    suggestions_visible: bool,
    pending: Option<PendingLoad>,
}

impl QuestionNavigator {
    /// Create a navigator positioned on the first question with its hints shown.
    pub fn new(questions: Vec<Question>) -> Self {
        let suggestions_visible = !questions.is_empty();
        Self {
            questions,
            current: 0,
            suggestions_visible,
            pending: None,
        }
    }

    pub fn from_set(set: QuestionSet) -> Self {
        Self::new(set.questions)
    }

    /// No questions have arrived yet.
    pub fn is_loading(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.questions.len()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            current: if self.questions.is_empty() { 0 } else { self.current + 1 },
            total: self.questions.len(),
        }
    }

    /// Advance to the next question. Returns whether the cursor moved.
    pub fn next(&mut self, now: Instant) -> bool {
        if self.current + 1 < self.questions.len() {
            self.move_to(self.current + 1, now);
            true
        } else {
            false
        }
    }

    /// Go back to the previous question. Returns whether the cursor moved.
    pub fn previous(&mut self, now: Instant) -> bool {
        if self.current > 0 && !self.questions.is_empty() {
            self.move_to(self.current - 1, now);
            true
        } else {
            false
        }
    }

    fn move_to(&mut self, index: usize, now: Instant) {
        self.current = index;
        self.suggestions_visible = false;
        self.pending = Some(PendingLoad {
            index,
            due: now + SUGGESTION_DELAY,
        });
    }

    /// Hints to show in the sidebar right now.
    pub fn visible_suggestions(&self) -> &[Suggestion] {
        match self.current() {
            Some(q) if self.suggestions_visible => &q.suggestions,
            _ => &[],
        }
    }

    /// Whether a hint load is scheduled but not yet due.
    pub fn suggestions_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the scheduled hint load becomes due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.due)
    }

    /// Resolve a scheduled hint load. Returns true when hints just appeared.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(load) if now >= load.due => {
                self.pending = None;
                if load.index == self.current {
                    self.suggestions_visible = true;
                    return true;
                }
                false
            }
            _ => false,
        }
    }
}
