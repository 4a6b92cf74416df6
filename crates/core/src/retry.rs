//! Bounded fixed-delay retry.
//!
//! Filesystem mutations against scanner-managed directories can hit busy
//! files; [`retry_fixed`] retries those a bounded number of times and
//! propagates everything else immediately.

use std::future::Future;
use std::time::Duration;

/// Run `op` up to `attempts` times, sleeping `delay` between tries.
///
/// `is_transient` classifies errors: a transient error consumes an attempt,
/// any other error is returned at once. The final transient error is
/// returned when attempts are exhausted.
pub async fn retry_fixed<T, E, F, Fut, C>(
    attempts: u32,
    delay: Duration,
    is_transient: C,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
{
    debug_assert!(attempts >= 1);
    let mut remaining = attempts;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                remaining -= 1;
                if remaining == 0 || !is_transient(&err) {
                    return Err(err);
                }
                tracing::debug!(remaining, delay_ms = delay.as_millis() as u64, "Retrying transient failure");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestErr {
        Busy,
        Fatal,
    }

    fn transient(e: &TestErr) -> bool {
        *e == TestErr::Busy
    }

    #[tokio::test]
    async fn succeeds_first_try_without_sleeping() {
        let result: Result<i32, TestErr> =
            retry_fixed(5, Duration::from_millis(1), transient, || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry_fixed(5, Duration::from_millis(1), transient, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(TestErr::Busy)
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_attempts_on_persistent_busy() {
        let calls = AtomicU32::new(0);
        let result: Result<(), TestErr> = retry_fixed(3, Duration::from_millis(1), transient, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestErr::Busy) }
        })
        .await;
        assert_eq!(result.unwrap_err(), TestErr::Busy);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_error_propagates_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), TestErr> = retry_fixed(5, Duration::from_millis(1), transient, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestErr::Fatal) }
        })
        .await;
        assert_eq!(result.unwrap_err(), TestErr::Fatal);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
