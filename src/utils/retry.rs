use std::future::Future;
use tokio::time::{sleep, Duration};

/// Runs `f` up to `attempts` times, sleeping `delay * attempt` between tries.
///
/// Only errors for which `should_retry` returns true are retried; anything else
/// is returned immediately.
pub async fn with_retry<F, Fut, T, E, P>(
    f: F,
    attempts: u32,
    delay: Duration,
    should_retry: P,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if attempt >= attempts || !should_retry(&e) {
                    return Err(e);
                }
                sleep(delay * attempt).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = with_retry(
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err("flaky") } else { Ok(n) }
            },
            5,
            Duration::from_millis(1),
            |_| true,
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("down")
            },
            2,
            Duration::from_millis(1),
            |_| true,
        )
        .await;

        assert_eq!(result, Err("down"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("unauthorized")
            },
            4,
            Duration::from_millis(1),
            |e| *e != "unauthorized",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
