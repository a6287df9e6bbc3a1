//! Bounded retry with exponential backoff for Roomledger.
//!
//! Every ledger interaction that can fail for reasons outside our control
//! (a node restarting, a transaction not yet included in a block) goes
//! through [`retry`] or [`retry_if`]. The engine is small:
//!
//! - attempts are 1-indexed and capped at [`RetryPolicy::max_attempts`];
//! - after each retried failure it sleeps for the next [`Backoff`] delay,
//!   which starts at `initial_delay`, grows by `backoff_factor`, and is
//!   capped at `max_delay`;
//! - a failure the predicate rejects, or the failure on the last allowed
//!   attempt, ends the loop immediately with that error.
//!
//! # Classification
//!
//! Errors crossing the ledger boundary implement [`Classify`]. [`retry`]
//! retries [`ErrorClass::Transient`] and [`ErrorClass::Unknown`] failures
//! and gives up at once on [`ErrorClass::Permanent`] ones, so an invalid
//! input is not resubmitted five times before it surfaces.
//!
//! ```ignore
//! let room = retry(&policy, || ledger.get_mapping_value(program, "rooms", &key)).await?;
//! ```

mod backoff;
mod error;

pub use backoff::Backoff;
pub use error::RetryError;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// How an error should be treated by the retry engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Likely to succeed if tried again (timeouts, 5xx, not yet confirmed).
    Transient,
    /// Will fail the same way every time (rejected input, malformed data).
    Permanent,
    /// Could be either. Treated as retryable.
    Unknown,
}

impl ErrorClass {
    /// Returns `true` unless the error is known to be permanent.
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::Permanent)
    }
}

/// Implemented by errors that know whether retrying them can help.
pub trait Classify {
    fn class(&self) -> ErrorClass;
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Attempt budget and delay schedule for one call site.
///
/// A policy holds no per-call state, so one value can be shared by any
/// number of concurrent operations.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Multiplier applied after each retried failure. At least 1.0.
    pub backoff_factor: f64,
    /// Apply "equal jitter": each delay is drawn from `[d/2, d]`.
    /// Off by default so the schedule is exactly reproducible.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(30_000),
            backoff_factor: 2.0,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// The default policy with a different attempt budget.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// A policy that retries without sleeping. Handy in tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    /// Clamp and fix any out-of-range values so the policy is safe to use.
    ///
    /// Called automatically by [`retry_if`]. Rules:
    /// - `max_attempts` raised to 1.
    /// - `backoff_factor` below 1.0 (or NaN) replaced by 1.0.
    /// - `max_delay` raised to `initial_delay`.
    pub fn validated(mut self) -> Self {
        if self.max_attempts == 0 {
            warn!("max_attempts is 0, using 1");
            self.max_attempts = 1;
        }
        if !(self.backoff_factor >= 1.0) {
            warn!(
                factor = self.backoff_factor,
                "backoff_factor below 1.0, using 1.0"
            );
            self.backoff_factor = 1.0;
        }
        if self.max_delay < self.initial_delay {
            self.max_delay = self.initial_delay;
        }
        self
    }

    /// The delay schedule this policy produces, before jitter.
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.initial_delay, self.max_delay, self.backoff_factor)
    }

    /// Worst-case total time spent sleeping if every attempt fails.
    pub fn max_total_delay(&self) -> Duration {
        let retries = self.max_attempts.saturating_sub(1) as usize;
        self.backoff().take(retries).sum()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Runs `operation` under `policy`, retrying errors whose
/// [`Classify::class`] is retryable.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + fmt::Display,
{
    retry_if(policy, operation, |e: &E| e.class().is_retryable()).await
}

/// Runs `operation` under `policy`, retrying while `should_retry` returns
/// `true` for the observed error.
///
/// Returns the first success, or the error that ended the loop:
/// [`RetryError::Aborted`] when the predicate rejected it,
/// [`RetryError::Exhausted`] when the attempt budget ran out.
pub async fn retry_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    mut operation: F,
    mut should_retry: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
    E: fmt::Display,
{
    let policy = policy.clone().validated();
    let mut delays = policy.backoff();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let error = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !should_retry(&error) {
            debug!(attempt, %error, "error is not retryable");
            return Err(RetryError::Aborted {
                attempt,
                source: error,
            });
        }
        if attempt >= policy.max_attempts {
            warn!(attempts = attempt, %error, "retries exhausted");
            return Err(RetryError::Exhausted {
                attempts: attempt,
                source: error,
            });
        }

        let delay = delays.next().unwrap_or(policy.max_delay);
        let delay = if policy.jitter {
            equal_jitter(delay)
        } else {
            delay
        };
        warn!(
            attempt,
            max_attempts = policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            %error,
            "operation failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Draws a delay uniformly from `[d/2, d]`.
fn equal_jitter(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    if ms <= 1 {
        return delay;
    }
    let half = ms / 2;
    let extra = rand::rng().random_range(0..=half);
    Duration::from_millis(half.saturating_add(extra))
}
