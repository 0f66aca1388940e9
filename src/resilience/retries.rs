//! Retry policy.
//!
//! # Design Decisions
//! - Fixed delay between attempts, no exponential growth and no jitter
//! - Attempts are bounded; exhaustion is an outcome, not an error
//! - A fault inside one attempt is a regular outcome the loop can move past

use std::time::Duration;

/// Bounded, fixed-interval retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause after each failed attempt that is not the last.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    ///
    /// `None` once no attempts remain.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then_some(self.delay)
    }
}

/// Result of a single attempt.
#[derive(Debug)]
pub enum AttemptOutcome<E> {
    /// The operation completed.
    Succeeded,
    /// The operation reported an error.
    Failed(E),
    /// The attempt crashed; the message describes the fault.
    Faulted(String),
}

impl<E> AttemptOutcome<E> {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Succeeded => "success",
            AttemptOutcome::Failed(_) => "failure",
            AttemptOutcome::Faulted(_) => "fault",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_delay_until_last_attempt() {
        let policy = RetryPolicy::fixed(5, Duration::from_secs(5));
        for attempt in 1..5 {
            assert_eq!(policy.delay_after(attempt), Some(Duration::from_secs(5)));
        }
        assert_eq!(policy.delay_after(5), None);
        assert_eq!(policy.delay_after(6), None);
    }

    #[test]
    fn single_attempt_never_waits() {
        let policy = RetryPolicy::fixed(1, Duration::from_secs(5));
        assert_eq!(policy.delay_after(1), None);
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(AttemptOutcome::<()>::Succeeded.label(), "success");
        assert_eq!(AttemptOutcome::Failed(()).label(), "failure");
        assert_eq!(AttemptOutcome::<()>::Faulted("boom".into()).label(), "fault");
    }
}
