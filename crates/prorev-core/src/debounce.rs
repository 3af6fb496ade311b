//! Deadline timer that fires once after a quiet period.

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

/// Default quiet period after the last stroke before asking for feedback.
pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(1500);

/// A restartable one-shot timer polled from the frame loop.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(DEFAULT_FEEDBACK_DELAY)
    }
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Arm (or re-arm) the timer.
    pub fn start(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true exactly once when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_delay() {
        let now = Instant::now();
        let mut timer = Debounce::default();
        timer.start(now);
        assert!(!timer.poll(now + Duration::from_millis(1499)));
        assert!(timer.poll(now + Duration::from_millis(1500)));
        assert!(!timer.poll(now + Duration::from_millis(3000)));
    }

    #[test]
    fn test_restart_pushes_deadline() {
        let now = Instant::now();
        let mut timer = Debounce::new(Duration::from_millis(100));
        timer.start(now);
        timer.start(now + Duration::from_millis(80));
        assert!(!timer.poll(now + Duration::from_millis(120)));
        assert!(timer.poll(now + Duration::from_millis(180)));
    }

    #[test]
    fn test_cancel() {
        let now = Instant::now();
        let mut timer = Debounce::default();
        timer.start(now);
        timer.cancel();
        assert!(!timer.is_pending());
        assert!(!timer.poll(now + Duration::from_secs(10)));
    }
}
