//! Bounded exponential retry schedule.

use std::time::Duration;

use eqsplice_config::RetryPolicy;

/// Yields the delays before each readiness check of one element.
///
/// The first delay is the load timeout; after that the poll interval starts
/// at the initial delay and grows geometrically up to the cap. The schedule
/// ends after `max_attempts` delays.
///
/// ```rust
/// use std::time::Duration;
/// use eqsplice_config::RetryPolicy;
/// use eqsplice_splice::Backoff;
///
/// let mut backoff = Backoff::new(RetryPolicy::default());
/// assert_eq!(backoff.next_delay(), Some(Duration::from_millis(1000)));
/// assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
/// assert_eq!(backoff.next_delay(), Some(Duration::from_millis(200)));
/// ```
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    attempts: u32,
    interval_ms: u64,
}

impl Backoff {
    /// Starts a fresh schedule.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            interval_ms: policy.initial_delay_ms,
        }
    }

    /// The next delay, or `None` once the attempts are used up.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.policy.max_attempts {
            return None;
        }
        self.attempts += 1;

        if self.attempts == 1 {
            return Some(self.policy.load_timeout());
        }

        let delay = self.interval_ms.min(self.policy.max_delay_ms);
        let grown = (self.interval_ms as f64 * f64::from(self.policy.multiplier.max(1.0))).round();
        self.interval_ms = if grown >= self.policy.max_delay_ms as f64 {
            self.policy.max_delay_ms
        } else {
            grown as u64
        };
        Some(Duration::from_millis(delay))
    }

    /// Delays handed out so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether [`Backoff::next_delay`] will return `None`.
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.policy.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(backoff: &mut Backoff) -> Vec<u128> {
        std::iter::from_fn(|| backoff.next_delay())
            .map(|d| d.as_millis())
            .collect()
    }

    #[test]
    fn default_schedule() {
        let mut backoff = Backoff::new(RetryPolicy::default());
        assert_eq!(
            millis(&mut backoff),
            vec![1000, 100, 200, 400, 800, 1000, 1000, 1000, 1000, 1000]
        );
        assert!(backoff.is_exhausted());
        assert_eq!(backoff.next_delay(), None);
    }

    #[test]
    fn constant_interval_with_unit_multiplier() {
        let policy = RetryPolicy {
            load_timeout_ms: 0,
            initial_delay_ms: 100,
            multiplier: 1.0,
            max_delay_ms: 1000,
            max_attempts: 4,
        };
        assert_eq!(millis(&mut Backoff::new(policy)), vec![0, 100, 100, 100]);
    }

    #[test]
    fn zero_attempts_never_yields() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        let mut backoff = Backoff::new(policy);
        assert!(backoff.is_exhausted());
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.attempts(), 0);
    }
}
