use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{KinoError, Result};

/// Fixed backoff ladder from spec §4.1: 500ms, 1s, 2s, then give up.
const BACKOFF: [Duration; 3] = [
    Duration::from_millis(500),
    Duration::from_secs(1),
    Duration::from_secs(2),
];

/// Retries a transient-failing request up to `BACKOFF.len()` times with
/// exponential backoff, respecting cancellation at every wait point.
/// Authentication and not-found failures are never retried (they are not
/// transient — see `KinoError::is_transient`).
pub async fn with_retry<T, F, Fut>(
    cancel: &CancellationToken,
    op_name: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0usize;
    loop {
        if cancel.is_cancelled() {
            return Err(KinoError::ServerOffline);
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < BACKOFF.len() => {
                let delay = BACKOFF[attempt];
                warn!(
                    op = op_name,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure, retrying"
                );
                attempt += 1;
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return Err(KinoError::ServerOffline),
                }
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry_on_first_success() {
        let cancel = CancellationToken::new();
        let calls = AtomicUsize::new(0);
        let result = with_retry(&cancel, "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, KinoError>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        let cancel = CancellationToken::new();
        let calls = AtomicUsize::new(0);
        let result = with_retry(&cancel, "test", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(KinoError::ServerOffline)
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn never_retries_auth_failures() {
        let cancel = CancellationToken::new();
        let calls = AtomicUsize::new(0);
        let result: Result<i32> = with_retry(&cancel, "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(KinoError::AuthFailed)
        })
        .await;
        assert!(matches!(result, Err(KinoError::AuthFailed)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_exhausting_backoff_ladder() {
        let cancel = CancellationToken::new();
        let calls = AtomicUsize::new(0);
        let result: Result<i32> = with_retry(&cancel, "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(KinoError::ServerOffline)
        })
        .await;
        assert!(matches!(result, Err(KinoError::ServerOffline)));
        assert_eq!(calls.load(Ordering::SeqCst), BACKOFF.len() + 1);
    }
}
