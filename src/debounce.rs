//! Deadline-based debouncing for the event-loop tick.
//!
//! Each new trigger supersedes the outstanding deadline, so a burst of
//! inputs settles into at most one firing per quiet period. Poll from the
//! tick loop; there are no timer threads.

use std::time::{Duration, Instant};

/// Delay for progress-slider commits.
pub const PROGRESS_COMMIT_DELAY: Duration = Duration::from_millis(500);
/// Delay for search/id-search text inputs.
pub const SEARCH_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            deadline: None,
        }
    }

    /// Arm (or re-arm) the deadline. The previous pending deadline, if any,
    /// is discarded.
    pub fn trigger(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Drop any pending deadline without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once per settled burst: when the armed deadline has
    /// passed. Clears the deadline.
    pub fn fire_if_due(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Force the pending deadline to fire now (commit-on-release paths).
    pub fn flush(&mut self) -> bool {
        let pending = self.is_pending();
        self.deadline = None;
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn burst_settles_into_one_firing() {
        let mut debouncer = Debouncer::new(Duration::from_millis(20));
        for _ in 0..5 {
            debouncer.trigger();
            assert!(!debouncer.fire_if_due());
        }
        thread::sleep(Duration::from_millis(30));
        assert!(debouncer.fire_if_due());
        assert!(!debouncer.fire_if_due());
    }

    #[test]
    fn retrigger_extends_the_deadline() {
        let mut debouncer = Debouncer::new(Duration::from_millis(40));
        debouncer.trigger();
        thread::sleep(Duration::from_millis(25));
        debouncer.trigger();
        // first deadline would have passed by now; the re-arm superseded it
        thread::sleep(Duration::from_millis(25));
        assert!(!debouncer.fire_if_due());
        thread::sleep(Duration::from_millis(20));
        assert!(debouncer.fire_if_due());
    }

    #[test]
    fn cancel_discards_the_deadline() {
        let mut debouncer = Debouncer::new(Duration::from_millis(5));
        debouncer.trigger();
        debouncer.cancel();
        thread::sleep(Duration::from_millis(10));
        assert!(!debouncer.fire_if_due());
    }

    #[test]
    fn flush_reports_whether_anything_was_pending() {
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        assert!(!debouncer.flush());
        debouncer.trigger();
        assert!(debouncer.flush());
        assert!(!debouncer.is_pending());
    }
}
