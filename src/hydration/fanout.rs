//! # Fan-out/Fan-in Sub-fetch
//!
//! Concurrent fetch of a dynamic list of sub-items (e.g. one call per named
//! inline policy) merged into one aggregate value.
//!
//! Policy is stricter than row-level hydration: the first error wins and
//! the whole aggregate is discarded, because a partial sub-item list is
//! considered misleading. Every spawned task is joined before results are
//! examined, so no task outlives the call even on the error path.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::provider::{ErrorKind, ProviderError, RawRow};

/// Fetch every item concurrently, bounded by `max_concurrent` in-flight
/// fetches, and collect the values in item order.
///
/// # Errors
///
/// Returns the first failure observed while draining the joined tasks; any
/// partial successes are discarded.
pub async fn fetch_all<T, F, Fut>(
    items: Vec<T>,
    max_concurrent: usize,
    mut fetch: F,
) -> Result<Vec<RawRow>, ProviderError>
where
    T: Send + 'static,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<RawRow, ProviderError>> + Send + 'static,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let total = items.len();

    let mut handles = Vec::with_capacity(total);
    for item in items {
        let semaphore = semaphore.clone();
        let future = fetch(item);
        handles.push(tokio::spawn(async move {
            // Closed-semaphore errors cannot happen here; the semaphore
            // lives as long as every permit holder.
            let _permit = semaphore.acquire_owned().await.ok();
            future.await
        }));
    }

    // Fan-in barrier: join every task before examining any result.
    let mut values = Vec::with_capacity(total);
    let mut first_error: Option<ProviderError> = None;

    for handle in handles {
        match handle.await {
            Ok(Ok(value)) => values.push(value),
            Ok(Err(error)) => {
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
            Err(join_error) => {
                if first_error.is_none() {
                    first_error = Some(ProviderError::new(
                        ErrorKind::Other,
                        "fan_out",
                        "TaskPanicked",
                        &join_error.to_string(),
                    ));
                }
            }
        }
    }

    match first_error {
        Some(error) => {
            debug!(total, error = %error, "Fan-out batch failed; discarding partial results");
            Err(error)
        }
        None => Ok(values),
    }
}
