//! Bounded polling for assets that become usable asynchronously, such as a
//! web font the icon glyphs are drawn with.
//!
//! Time is passed in by the caller, so the poll runs the same against
//! `performance.now()` or a virtual clock.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Seconds between attempts.
    pub delay: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 20, delay: 0.1 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    GaveUp,
}

#[derive(Clone, Debug)]
pub struct ReadinessPoll {
    policy: RetryPolicy,
    attempts: u32,
    next_at: Option<f64>,
    state: Readiness,
}

impl ReadinessPoll {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempts: 0, next_at: None, state: Readiness::Pending }
    }

    pub fn state(&self) -> Readiness {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Probe if an attempt is due. Returns the terminal state on the call that
    /// reaches it and `None` otherwise, so callers act on it exactly once.
    pub fn poll(&mut self, now: f64, probe: impl FnOnce() -> bool) -> Option<Readiness> {
        if self.state != Readiness::Pending {
            return None;
        }
        if self.next_at.is_some_and(|at| now < at) {
            return None;
        }

        self.attempts += 1;
        if probe() {
            self.state = Readiness::Ready;
            log::debug!("assets ready after {} attempt(s)", self.attempts);
        } else if self.attempts >= self.policy.max_attempts {
            self.state = Readiness::GaveUp;
            log::warn!("assets not ready after {} attempts, using placeholders", self.attempts);
        } else {
            self.next_at = Some(now + self.policy.delay);
            return None;
        }
        Some(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_on_first_probe() {
        let mut poll = ReadinessPoll::new(RetryPolicy::default());
        assert_eq!(poll.poll(0.0, || true), Some(Readiness::Ready));
        assert_eq!(poll.poll(1.0, || true), None);
    }

    #[test]
    fn waits_between_attempts() {
        let mut poll = ReadinessPoll::new(RetryPolicy { max_attempts: 5, delay: 0.1 });
        assert_eq!(poll.poll(0.0, || false), None);
        let mut probed = false;
        let outcome = poll.poll(0.05, || {
            probed = true;
            true
        });
        assert_eq!(outcome, None);
        assert!(!probed);
        assert_eq!(poll.poll(0.1, || true), Some(Readiness::Ready));
        assert_eq!(poll.attempts(), 2);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut poll = ReadinessPoll::new(RetryPolicy { max_attempts: 3, delay: 0.1 });
        let mut now = 0.0;
        let mut outcome = None;
        for _ in 0..10 {
            if let Some(state) = poll.poll(now, || false) {
                outcome = Some(state);
            }
            now += 0.1;
        }
        assert_eq!(outcome, Some(Readiness::GaveUp));
        assert_eq!(poll.attempts(), 3);
    }
}
