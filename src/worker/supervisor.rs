//! Restarting failed workers.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::retry::RetryConfig;

use super::WorkerError;

/// A run at least this long resets the backoff.
const HEALTHY_RUN: Duration = Duration::from_secs(60);

/// How a supervised worker stopped for the last time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stopped {
    /// The worker returned after shutdown was requested.
    Shutdown,
    /// It failed more often than the backoff allows.
    GaveUp { restarts: u32 },
}

/// Runs the worker built by `factory`, restarting it with backoff whenever it
/// returns an error or panics, until `shutdown` is cancelled.
///
/// Each run is a separate tokio task, so a panic ends only that run. A worker
/// returning `Ok` is taken to have seen the shutdown and is not restarted.
pub async fn supervise<F, Fut>(
    name: &'static str,
    shutdown: CancellationToken,
    backoff: RetryConfig,
    mut factory: F,
) -> Stopped
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), WorkerError>> + Send + 'static,
{
    let mut attempt: u32 = 0;
    let mut restarts: u32 = 0;
    loop {
        let started = Instant::now();
        match tokio::spawn(factory()).await {
            Ok(Ok(())) => {
                info!(worker = name, "Worker stopped");
                return Stopped::Shutdown;
            }
            Ok(Err(e)) => error!(worker = name, error = %e, "Worker failed"),
            Err(e) if e.is_panic() => error!(worker = name, "Worker panicked"),
            Err(e) => error!(worker = name, error = %e, "Worker task aborted"),
        }

        if shutdown.is_cancelled() {
            return Stopped::Shutdown;
        }
        if started.elapsed() >= HEALTHY_RUN {
            attempt = 0;
        }
        if restarts >= backoff.max_retries {
            warn!(worker = name, restarts, "Giving up on worker");
            return Stopped::GaveUp { restarts };
        }

        let delay = backoff.delay_for_attempt(attempt);
        warn!(worker = name, delay_ms = delay.as_millis() as u64, "Restarting worker after backoff");
        tokio::select! {
            _ = shutdown.cancelled() => return Stopped::Shutdown,
            _ = tokio::time::sleep(delay) => {}
        }
        attempt = attempt.saturating_add(1);
        restarts += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig::new(5, Duration::from_millis(1), Duration::from_millis(4), 2.0)
    }

    #[tokio::test]
    async fn restarts_after_errors_until_shutdown() {
        let shutdown = CancellationToken::new();
        let runs = Arc::new(AtomicU32::new(0));

        let stopped = {
            let runs = Arc::clone(&runs);
            let shutdown_for_worker = shutdown.clone();
            supervise("test", shutdown.clone(), fast(), move || {
                let run = runs.fetch_add(1, Ordering::SeqCst);
                let shutdown = shutdown_for_worker.clone();
                async move {
                    if run < 2 {
                        Err::<(), _>(WorkerError::Store(StoreError::Poisoned))
                    } else {
                        shutdown.cancel();
                        Ok(())
                    }
                }
            })
            .await
        };

        assert_eq!(stopped, Stopped::Shutdown);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn restarts_after_panic() {
        let shutdown = CancellationToken::new();
        let runs = Arc::new(AtomicU32::new(0));

        let stopped = {
            let runs = Arc::clone(&runs);
            supervise("test", shutdown.clone(), fast(), move || {
                let run = runs.fetch_add(1, Ordering::SeqCst);
                async move {
                    if run == 0 {
                        panic!("worker bug");
                    }
                    Ok::<(), WorkerError>(())
                }
            })
            .await
        };

        assert_eq!(stopped, Stopped::Shutdown);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_restarts() {
        let runs = Arc::new(AtomicU32::new(0));
        let config = RetryConfig::new(2, Duration::from_millis(1), Duration::from_millis(1), 1.0);

        let stopped = {
            let runs = Arc::clone(&runs);
            supervise("test", CancellationToken::new(), config, move || {
                runs.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(WorkerError::Store(StoreError::Poisoned)) }
            })
            .await
        };

        assert_eq!(stopped, Stopped::GaveUp { restarts: 2 });
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failure_after_shutdown_is_not_restarted() {
        let shutdown = CancellationToken::new();
        let config = RetryConfig::new(5, Duration::from_secs(3600), Duration::from_secs(3600), 2.0);

        let stopped = {
            let shutdown_for_worker = shutdown.clone();
            supervise("test", shutdown.clone(), config, move || {
                let shutdown = shutdown_for_worker.clone();
                async move {
                    shutdown.cancel();
                    Err::<(), _>(WorkerError::Store(StoreError::Poisoned))
                }
            })
            .await
        };

        assert_eq!(stopped, Stopped::Shutdown);
    }
}
