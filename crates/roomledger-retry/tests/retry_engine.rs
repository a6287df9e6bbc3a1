//! Integration tests for the retry engine.
//!
//! Uses `start_paused = true` so backoff sleeps auto-advance the Tokio
//! clock; elapsed time then equals the sum of the scheduled delays.

use std::cell::Cell;
use std::fmt;
use std::time::Duration;

use roomledger_retry::{
    retry, retry_if, Classify, ErrorClass, RetryError, RetryPolicy,
};
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
enum TestError {
    Flaky(u32),
    Fatal,
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flaky(n) => write!(f, "flaky failure #{n}"),
            Self::Fatal => write!(f, "fatal failure"),
        }
    }
}

impl Classify for TestError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::Flaky(_) => ErrorClass::Transient,
            Self::Fatal => ErrorClass::Permanent,
        }
    }
}

fn assert_close(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual < expected + Duration::from_millis(50),
        "elapsed {actual:?}, expected about {expected:?}"
    );
}

// =========================================================================
// Attempt counting
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_first_success_makes_one_call() {
    let calls = Cell::new(0u32);
    let result: Result<u32, RetryError<TestError>> =
        retry(&RetryPolicy::default(), || {
            calls.set(calls.get() + 1);
            async { Ok(7) }
        })
        .await;
    assert_eq!(result.unwrap(), 7);
    assert_eq!(calls.get(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_always_failing_calls_exactly_max_attempts() {
    for n in 1..=6 {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = retry(&RetryPolicy::with_max_attempts(n), || {
            calls.set(calls.get() + 1);
            let attempt = calls.get();
            async move { Err(TestError::Flaky(attempt)) }
        })
        .await;

        assert_eq!(calls.get(), n);
        let err = result.unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), n);
        // The last observed error is the one surfaced.
        assert_eq!(err.into_inner(), TestError::Flaky(n));
    }
}

#[tokio::test(start_paused = true)]
async fn test_success_after_transient_failures() {
    let calls = Cell::new(0u32);
    let result = retry(&RetryPolicy::default(), || {
        calls.set(calls.get() + 1);
        let attempt = calls.get();
        async move {
            if attempt < 3 {
                Err(TestError::Flaky(attempt))
            } else {
                Ok("done")
            }
        }
    })
    .await;
    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.get(), 3);
}

// =========================================================================
// Predicate
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_rejecting_predicate_stops_after_one_attempt_without_delay() {
    let calls = Cell::new(0u32);
    let start = Instant::now();
    let result: Result<(), _> = retry_if(
        &RetryPolicy::default(),
        || {
            calls.set(calls.get() + 1);
            async { Err(TestError::Flaky(1)) }
        },
        |_| false,
    )
    .await;

    assert_eq!(calls.get(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    let err = result.unwrap_err();
    assert!(matches!(err, RetryError::Aborted { attempt: 1, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_permanent_error_is_not_retried_by_default() {
    let calls = Cell::new(0u32);
    let result: Result<(), _> = retry(&RetryPolicy::default(), || {
        calls.set(calls.get() + 1);
        async { Err(TestError::Fatal) }
    })
    .await;

    assert_eq!(calls.get(), 1);
    assert_eq!(result.unwrap_err().into_inner(), TestError::Fatal);
}

#[tokio::test(start_paused = true)]
async fn test_always_true_predicate_retries_permanent_errors() {
    let calls = Cell::new(0u32);
    let result: Result<(), _> = retry_if(
        &RetryPolicy::immediate(5),
        || {
            calls.set(calls.get() + 1);
            async { Err(TestError::Fatal) }
        },
        |_| true,
    )
    .await;

    assert_eq!(calls.get(), 5);
    assert!(result.unwrap_err().is_exhausted());
}

#[tokio::test(start_paused = true)]
async fn test_permanent_error_mid_sequence_stops_retrying() {
    let calls = Cell::new(0u32);
    let result: Result<(), _> = retry(&RetryPolicy::default(), || {
        calls.set(calls.get() + 1);
        let attempt = calls.get();
        async move {
            if attempt == 2 {
                Err(TestError::Fatal)
            } else {
                Err(TestError::Flaky(attempt))
            }
        }
    })
    .await;

    assert_eq!(calls.get(), 2);
    let err = result.unwrap_err();
    assert!(matches!(err, RetryError::Aborted { attempt: 2, .. }));
}

// =========================================================================
// Delay schedule
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_sleeps_follow_backoff_schedule() {
    // 8 attempts → 7 sleeps: 1 + 2 + 4 + 8 + 16 + 30 + 30 = 91 s.
    let start = Instant::now();
    let stamps = std::cell::RefCell::new(Vec::new());
    let result: Result<(), _> = retry(&RetryPolicy::with_max_attempts(8), || {
        stamps.borrow_mut().push(start.elapsed());
        async { Err(TestError::Flaky(0)) }
    })
    .await;
    assert!(result.is_err());

    let stamps = stamps.into_inner();
    assert_eq!(stamps.len(), 8);
    let gaps: Vec<Duration> = stamps.windows(2).map(|w| w[1] - w[0]).collect();
    let expected = [1, 2, 4, 8, 16, 30, 30];
    for (gap, secs) in gaps.iter().zip(expected) {
        assert_close(*gap, Duration::from_secs(secs));
    }
    assert_close(start.elapsed(), Duration::from_secs(91));
}

#[tokio::test(start_paused = true)]
async fn test_no_sleep_after_final_attempt() {
    let start = Instant::now();
    let result: Result<(), _> = retry(&RetryPolicy::with_max_attempts(3), || async {
        Err(TestError::Flaky(0))
    })
    .await;
    assert!(result.is_err());
    // Two sleeps (1 s + 2 s); the third failure returns immediately.
    assert_close(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_jittered_delays_stay_within_half_to_full() {
    let policy = RetryPolicy {
        max_attempts: 4,
        jitter: true,
        ..Default::default()
    };
    let start = Instant::now();
    let result: Result<(), _> =
        retry(&policy, || async { Err(TestError::Flaky(0)) }).await;
    assert!(result.is_err());

    // Unjittered total is 7 s; equal jitter keeps it within [3.5 s, 7 s].
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(3_500), "{elapsed:?}");
    assert!(elapsed <= Duration::from_millis(7_050), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_zero_attempt_policy_still_runs_once() {
    let calls = Cell::new(0u32);
    let result: Result<(), _> = retry(&RetryPolicy::immediate(0), || {
        calls.set(calls.get() + 1);
        async { Err(TestError::Flaky(1)) }
    })
    .await;
    assert!(result.is_err());
    assert_eq!(calls.get(), 1);
}
