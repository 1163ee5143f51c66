use std::future::Future;
use std::time::Duration;

/// Retry an upstream operation with exponential backoff (1s/2s/4s at the
/// defaults). Only call sites that explicitly opt in get retries; everything
/// else surfaces the first failure.
pub async fn retry_with_backoff<T, E, F, Fut>(
    operation: &str,
    max_attempts: u32,
    base_delay: Duration,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = base_delay;
    let mut attempt = 1;

    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts => {
                tracing::warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Upstream call failed, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test(start_paused = true)]
    async fn succeeds_without_retry() {
        let calls = Cell::new(0u32);
        let result: Result<u32, String> =
            retry_with_backoff("op", 3, Duration::from_secs(1), || {
                calls.set(calls.get() + 1);
                async { Ok(7) }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = Cell::new(0u32);
        let result: Result<u32, String> =
            retry_with_backoff("op", 3, Duration::from_secs(1), || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err("transient".to_string())
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = Cell::new(0u32);
        let result: Result<u32, String> =
            retry_with_backoff("op", 3, Duration::from_secs(1), || {
                calls.set(calls.get() + 1);
                async { Err("down".to_string()) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }
}
