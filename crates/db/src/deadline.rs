use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Failure modes of a deadline-guarded operation.
#[derive(Debug, Error)]
pub enum DeadlineError {
    #[error("operation exceeded its deadline of {0:?}")]
    Elapsed(Duration),
    #[error("operation aborted before completing")]
    Aborted,
}

/// Race `op` against a fixed deadline and deliver exactly one outcome.
///
/// The operation is spawned onto the runtime, so when the timer fires first
/// the caller gets [`DeadlineError::Elapsed`] while the operation itself
/// keeps running detached; its eventual result is discarded. This is a soft
/// timeout: nothing is cancelled, the caller just stops waiting.
pub async fn run_with_deadline<F, T>(op: F, deadline: Duration) -> Result<T, DeadlineError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(op);

    match tokio::time::timeout(deadline, handle).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) => {
            tracing::error!(%join_error, "guarded operation aborted abnormally");
            Err(DeadlineError::Aborted)
        }
        Err(_) => Err(DeadlineError::Elapsed(deadline)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn fast_operation_passes_through() {
        let result = run_with_deadline(async { 42 }, Duration::from_secs(1)).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_operation_times_out() {
        let result = run_with_deadline(
            async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                42
            },
            Duration::from_secs(1),
        )
        .await;

        assert!(matches!(result, Err(DeadlineError::Elapsed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn late_result_is_discarded_but_operation_finishes() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);

        let result = run_with_deadline(
            async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                flag.store(true, Ordering::SeqCst);
                42
            },
            Duration::from_millis(100),
        )
        .await;

        assert!(matches!(result, Err(DeadlineError::Elapsed(_))));
        assert!(!finished.load(Ordering::SeqCst));

        // The abandoned operation keeps running and completes on its own.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_operation_reports_aborted() {
        let result: Result<(), _> = run_with_deadline(
            async { panic!("boom") },
            Duration::from_secs(1),
        )
        .await;

        assert!(matches!(result, Err(DeadlineError::Aborted)));
    }
}
