//! Bounded in-memory job storage.
//!
//! Jobs are kept in insertion order. Inserting beyond capacity evicts the
//! oldest job together with its result. A single mutex guards the whole
//! table; job counts are small, so every operation simply takes the lock.

use crate::error::JobError;
use indexmap::IndexMap;
use sc_protocol::job_models::{Job, JobId};
use sc_protocol::result_models::JobResult;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Everything stored for one job.
#[derive(Debug, Clone)]
pub struct JobEntry {
    pub job: Job,

    /// Present only once the job has completed.
    pub result: Option<JobResult>,

    /// Tripped when cancellation is requested, the job times out or it is evicted.
    pub cancel: CancellationToken,
}

impl JobEntry {
    fn new(job: Job) -> Self {
        Self {
            job,
            result: None,
            cancel: CancellationToken::new(),
        }
    }
}

struct JobTable {
    jobs: IndexMap<JobId, JobEntry>,
    capacity: usize,
}

impl JobTable {
    fn active_count(&self) -> usize {
        self.jobs
            .values()
            .filter(|entry| entry.job.state.is_active())
            .count()
    }

    /// Evict the oldest job if at capacity, then insert.
    fn insert(&mut self, job: Job) -> Option<JobEntry> {
        let mut evicted = None;
        while self.jobs.len() >= self.capacity && !self.jobs.is_empty() {
            evicted = self.jobs.shift_remove_index(0).map(|(_, entry)| entry);
        }
        self.jobs.insert(job.id, JobEntry::new(job));
        evicted
    }
}

/// Concurrency-safe keyed storage for jobs and their results.
pub struct JobStore {
    inner: Mutex<JobTable>,
}

impl JobStore {
    /// Create a store that keeps at most `capacity` jobs.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(JobTable {
                jobs: IndexMap::new(),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Insert a job, evicting the oldest one if the store is full.
    ///
    /// Returns the evicted entry, if any.
    pub async fn create(&self, job: Job) -> Option<JobEntry> {
        self.inner.lock().await.insert(job)
    }

    /// Insert a job only if fewer than `max_active` jobs are active.
    ///
    /// The admission check and the insert happen under one lock, so
    /// concurrent creates can never exceed the limit.
    pub async fn create_admitted(
        &self,
        job: Job,
        max_active: usize,
    ) -> Result<Option<JobEntry>, JobError> {
        let mut table = self.inner.lock().await;
        if table.active_count() >= max_active {
            return Err(JobError::TooManyJobs { max: max_active });
        }
        Ok(table.insert(job))
    }

    /// Snapshot of a job.
    pub async fn get(&self, id: JobId) -> Option<Job> {
        self.inner
            .lock()
            .await
            .jobs
            .get(&id)
            .map(|entry| entry.job.clone())
    }

    /// Read a stored entry under the lock.
    pub async fn inspect<F, R>(&self, id: JobId, f: F) -> Option<R>
    where
        F: FnOnce(&JobEntry) -> R,
    {
        self.inner.lock().await.jobs.get(&id).map(f)
    }

    /// Apply `f` to a stored job and return its output.
    ///
    /// Returns `None` without calling `f` if the job is absent.
    pub async fn update<F, R>(&self, id: JobId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Job) -> R,
    {
        self.update_entry(id, |entry| f(&mut entry.job)).await
    }

    /// Like [`update`](Self::update) with access to the whole entry.
    pub async fn update_entry<F, R>(&self, id: JobId, f: F) -> Option<R>
    where
        F: FnOnce(&mut JobEntry) -> R,
    {
        self.inner.lock().await.jobs.get_mut(&id).map(f)
    }

    /// Store the result of a job. No-op if the job is absent.
    pub async fn set_result(&self, id: JobId, result: JobResult) {
        if let Some(entry) = self.inner.lock().await.jobs.get_mut(&id) {
            entry.result = Some(result);
        }
    }

    pub async fn get_result(&self, id: JobId) -> Option<JobResult> {
        self.inner
            .lock()
            .await
            .jobs
            .get(&id)
            .and_then(|entry| entry.result.clone())
    }

    /// Cancellation token of a job.
    pub async fn cancel_token(&self, id: JobId) -> Option<CancellationToken> {
        self.inner
            .lock()
            .await
            .jobs
            .get(&id)
            .map(|entry| entry.cancel.clone())
    }

    /// Number of Pending or Processing jobs.
    pub async fn active_count(&self) -> usize {
        self.inner.lock().await.active_count()
    }

    /// The `limit` most recently created jobs, newest first.
    pub async fn list(&self, limit: usize) -> Vec<Job> {
        self.inner
            .lock()
            .await
            .jobs
            .values()
            .rev()
            .take(limit)
            .map(|entry| entry.job.clone())
            .collect()
    }

    /// Cancellation tokens of every active job.
    pub async fn active_tokens(&self) -> Vec<(JobId, CancellationToken)> {
        self.inner
            .lock()
            .await
            .jobs
            .iter()
            .filter(|(_, entry)| entry.job.state.is_active())
            .map(|(id, entry)| (*id, entry.cancel.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
