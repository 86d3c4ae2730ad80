//! Fixed-interval polling for document visibility and engine tasks.

use std::future::Future;
use std::time::Duration;

use search_bench_core::EngineError;
use tokio::time::Instant;

/// Poll `count` until it reports at least `expected` documents.
///
/// The first poll happens immediately, later ones every `interval`. With a
/// `timeout`, gives up with [`EngineError::IndexTimeout`] once that much time
/// has passed without reaching `expected`. Errors from `count` are returned
/// as is.
pub async fn poll_until_visible<F, Fut>(
    engine: &str,
    expected: usize,
    interval: Duration,
    timeout: Option<Duration>,
    mut count: F,
) -> Result<(), EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<usize, EngineError>>,
{
    let start = Instant::now();

    loop {
        let visible = count().await?;
        if visible >= expected {
            tracing::debug!(engine, visible, expected, "Indexing is done");
            return Ok(());
        }

        let waited = start.elapsed();
        if let Some(limit) = timeout {
            if waited >= limit {
                return Err(EngineError::IndexTimeout {
                    expected,
                    visible,
                    waited,
                });
            }
        }

        tracing::debug!(engine, visible, expected, "Indexing is still in progress");
        tokio::time::sleep(interval).await;
    }
}

/// Poll `finished` until it returns `true`.
///
/// Same schedule as [`poll_until_visible`]; gives up with
/// [`EngineError::TaskTimeout`] naming `task`.
pub async fn poll_until_finished<F, Fut>(
    engine: &str,
    task: &str,
    interval: Duration,
    timeout: Option<Duration>,
    mut finished: F,
) -> Result<(), EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, EngineError>>,
{
    let start = Instant::now();

    loop {
        if finished().await? {
            tracing::debug!(engine, task, "Task finished");
            return Ok(());
        }

        let waited = start.elapsed();
        if timeout.is_some_and(|limit| waited >= limit) {
            return Err(EngineError::TaskTimeout {
                task: task.to_string(),
                waited,
            });
        }

        tracing::debug!(engine, task, "Task still running");
        tokio::time::sleep(interval).await;
    }
}
