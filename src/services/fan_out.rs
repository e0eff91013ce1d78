use std::future::Future;
use std::sync::Arc;

use tokio::{sync::Semaphore, task::JoinSet};

use crate::error::{AppError, AppResult};

/// Outcome of a bounded fan-out: the items that succeeded, in input order,
/// and how many were dropped
#[derive(Debug)]
pub struct FanOut<T> {
    pub succeeded: Vec<T>,
    pub failed: usize,
}

impl<T> FanOut<T> {
    /// True when items were attempted and every one of them errored
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty() && self.failed > 0
    }
}

/// Runs `task` for every item on its own tokio task, with at most `limit` in flight.
///
/// A failing item is logged under `stage` and dropped; the batch itself never fails.
/// Each task returns an owned result and only this function merges them, after the
/// join, so the merged output does not depend on completion order. Dropping the
/// returned future aborts every outstanding task.
pub async fn bounded_fan_out<I, T, F, Fut>(
    stage: &'static str,
    items: Vec<I>,
    limit: usize,
    task: F,
) -> FanOut<T>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = AppResult<T>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        let work = task(item);
        tasks.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => work.await,
                Err(e) => Err(AppError::Internal(format!("worker limit closed: {}", e))),
            };
            (index, result)
        });
    }

    let mut indexed = Vec::new();
    let mut failed = 0;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(value))) => indexed.push((index, value)),
            Ok((index, Err(e))) => {
                tracing::warn!(stage, item = index, error = %e, "Item dropped");
                failed += 1;
            }
            Err(e) => {
                tracing::error!(stage, error = %e, "Task join error");
                failed += 1;
            }
        }
    }

    indexed.sort_by_key(|(index, _)| *index);

    if failed > 0 {
        tracing::warn!(
            stage,
            success_count = indexed.len(),
            error_count = failed,
            "Partial fetch failure"
        );
    }

    FanOut {
        succeeded: indexed.into_iter().map(|(_, value)| value).collect(),
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_preserves_input_order() {
        let outcome = bounded_fan_out("test", vec![30u64, 10, 20], 3, |delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(delay)
        })
        .await;

        assert_eq!(outcome.succeeded, vec![30, 10, 20]);
        assert_eq!(outcome.failed, 0);
    }

    #[tokio::test]
    async fn test_drops_failed_items() {
        let outcome = bounded_fan_out("test", vec![1, 2, 3, 4], 2, |n| async move {
            if n % 2 == 0 {
                Err(AppError::ExternalApi(format!("item {} failed", n)))
            } else {
                Ok(n * 10)
            }
        })
        .await;

        assert_eq!(outcome.succeeded, vec![10, 30]);
        assert_eq!(outcome.failed, 2);
        assert!(!outcome.all_failed());
    }

    #[tokio::test]
    async fn test_all_failed_only_when_every_item_errors() {
        let outcome: FanOut<u32> = bounded_fan_out("test", vec![1u32, 2], 2, |n| async move {
            Err(AppError::ExternalApi(format!("item {} failed", n)))
        })
        .await;
        assert!(outcome.all_failed());
        assert_eq!(outcome.failed, 2);
    }

    #[tokio::test]
    async fn test_respects_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let outcome = bounded_fan_out("test", (0..12).collect::<Vec<_>>(), 3, |n| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(n)
            }
        })
        .await;

        assert_eq!(outcome.succeeded.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let outcome: FanOut<u32> =
            bounded_fan_out("test", Vec::<u32>::new(), 4, |n| async move { Ok(n) }).await;
        assert!(outcome.succeeded.is_empty());
        assert_eq!(outcome.failed, 0);
        assert!(!outcome.all_failed());
    }
}
