//! Bounded pool for long-running media work.
//!
//! Speech, image and video work runs in its own task so it never holds up
//! the job tasks. At most `size` such tasks run at once across all jobs.

use crate::error::StageError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of idle workers.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `task` on a pool worker and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns the task's own error, or `StageError::Worker` if the task
    /// panicked or the pool was closed.
    pub async fn run<F, T>(&self, task: F) -> Result<T, StageError>
    where
        F: Future<Output = Result<T, StageError>> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| StageError::Worker("worker pool is closed".to_string()))?;

        let handle = tokio::spawn(async move {
            let _permit = permit;
            task.await
        });

        handle
            .await
            .map_err(|e| StageError::Worker(format!("offloaded task failed: {e}")))?
    }

    /// Refuse new work. Running tasks finish normally.
    pub fn close(&self) {
        self.permits.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_returns_task_result() {
        let pool = WorkerPool::new(2);
        assert_eq!(pool.run(async { Ok(21 * 2) }).await, Ok(42));

        let err = pool
            .run(async { Err::<(), _>(StageError::Render("no font".to_string())) })
            .await;
        assert_eq!(err, Err(StageError::Render("no font".to_string())));
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn test_panicking_task_is_worker_error() {
        let pool = WorkerPool::new(1);
        let result: Result<(), StageError> = pool.run(async { panic!("encoder crashed") }).await;

        assert!(matches!(result, Err(StageError::Worker(_))));
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let pool = pool.clone();
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                pool.run(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_closed_pool_rejects_work() {
        let pool = WorkerPool::new(1);
        pool.close();

        let result = pool.run(async { Ok(()) }).await;
        assert!(matches!(result, Err(StageError::Worker(_))));
    }
}
