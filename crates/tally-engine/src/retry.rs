//! # Transaction Retry Wrapper
//!
//! Bounded retry with exponential backoff around whole engine operations.
//!
//! ## Why whole-operation retry is safe
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  attempt 1 ── SQLITE_BUSY ──► sleep 50ms                                │
//! │  attempt 2 ── SQLITE_BUSY ──► sleep 100ms                               │
//! │  attempt 3 ── ok                                                        │
//! │                                                                         │
//! │  The wrapped closure re-runs from scratch, including its idempotency    │
//! │  pre-check. A retry that lost the race to a twin request finds the      │
//! │  twin's row and returns it - no duplicate effect.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only errors flagged retryable by [`EngineError::is_retryable`] are
//! retried; business errors surface immediately.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{EngineError, EngineResult};

/// Maximum attempts for one operation (initial try + retries).
pub const MAX_ATTEMPTS: u32 = 4;

/// Base backoff; doubles per failed attempt.
const BASE_BACKOFF: Duration = Duration::from_millis(50);

/// Runs `operation` up to [`MAX_ATTEMPTS`] times, backing off exponentially
/// between attempts on retryable faults.
pub async fn with_retries<T, F, Fut>(name: &str, mut operation: F) -> EngineResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = EngineResult<T>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                let backoff = BASE_BACKOFF * 2u32.pow(attempt - 1);
                warn!(
                    operation = name,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Retrying after transient storage fault"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tally_db::DbError;

    fn busy() -> EngineError {
        EngineError::Storage(DbError::Busy("database is locked".to_string()))
    }

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result = with_retries("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, EngineError>(42) }
        })
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = with_retries("test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(busy())
                } else {
                    Ok(7)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_business_error_not_retried() {
        let calls = AtomicU32::new(0);
        let result: EngineResult<()> = with_retries("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(EngineError::conflict("already void")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: EngineResult<()> = with_retries("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(busy()) }
        })
        .await;
        assert!(matches!(result, Err(EngineError::Storage(_))));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }
}
