//! The exponential delay schedule.

use std::time::Duration;

/// An endless iterator over retry delays.
///
/// Yields `initial`, then each previous delay multiplied by `factor`,
/// never exceeding `max`. With `initial = 1s`, `factor = 2`, `max = 30s`:
///
/// ```text
/// 1s, 2s, 4s, 8s, 16s, 30s, 30s, ...
/// ```
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
    factor: f64,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, factor: f64) -> Self {
        Self {
            next: initial.min(max),
            max,
            factor,
        }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        // Overflow or a non-finite product just means "at the cap".
        self.next = Duration::try_from_secs_f64(current.as_secs_f64() * self.factor)
            .unwrap_or(self.max)
            .min(self.max);
        Some(current)
    }
}
