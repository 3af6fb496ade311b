//! Tutor feedback and request bookkeeping.

use serde::{Deserialize, Serialize};

/// Message shown when the feedback service could not be reached or answered
/// with something unusable.
pub const FALLBACK_MESSAGE: &str = "Could not get feedback. Please try again.";

/// Verdict on the student's work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub is_correct: bool,
    /// Hint text, may embed `$...$` math.
    pub suggestion: String,
}

impl Feedback {
    pub fn new(is_correct: bool, suggestion: impl Into<String>) -> Self {
        Self {
            is_correct,
            suggestion: suggestion.into(),
        }
    }

    pub fn fallback() -> Self {
        Self::new(false, FALLBACK_MESSAGE)
    }
}

/// Identifies one outstanding feedback request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedbackTicket(u64);

/// Allows one request in flight and recognizes stale responses.
#[derive(Debug, Clone, Default)]
pub struct FeedbackGate {
    in_flight: Option<FeedbackTicket>,
    issued: u64,
}

impl FeedbackGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, unless one is already outstanding.
    pub fn begin(&mut self) -> Option<FeedbackTicket> {
        if self.in_flight.is_some() {
            return None;
        }
        self.issued += 1;
        let ticket = FeedbackTicket(self.issued);
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Settle a request. Returns false when the ticket is no longer current.
    pub fn finish(&mut self, ticket: FeedbackTicket) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    /// Forget the outstanding request; its response will be treated as stale.
    pub fn invalidate(&mut self) {
        self.in_flight = None;
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }
}
