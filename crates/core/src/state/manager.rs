//! Job manager coordinating storage, lifecycle transitions and notifications.
//!
//! The JobManager is the single entry point for all job mutation. Every
//! mutating call applies a transition from [`crate::state::job`] under the
//! store lock and queues the matching broadcast while still holding it, so
//! subscribers observe updates in the order they were applied.

use crate::error::JobError;
use crate::state::job::{self, ProgressUpdate};
use crate::state::notifier::{Notifier, SubscriberId, Subscription};
use crate::state::store::JobStore;
use sc_protocol::config_models::EngineConfig;
use sc_protocol::ipc::JobMessage;
use sc_protocol::job_models::{Job, JobId, JobParams, JobState, JobSummary, SlideUpdate};
use sc_protocol::result_models::JobResult;
use tokio_util::sync::CancellationToken;

/// Manages all jobs of one orchestration context.
///
/// The JobManager provides a centralized interface for:
/// - Admitting new jobs
/// - Moving jobs through their lifecycle
/// - Reporting job and slide progress
/// - Cancelling jobs
/// - Subscribing to live updates
pub struct JobManager {
    store: JobStore,
    notifier: Notifier,
    config: EngineConfig,
}

impl JobManager {
    /// Create a new JobManager. Must be called inside a Tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `config` - Admission limits, store capacity and supported languages
    pub fn new(config: EngineConfig) -> Self {
        Self {
            store: JobStore::new(config.max_jobs),
            notifier: Notifier::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Admit a new job in Pending state.
    ///
    /// If the store is full, the oldest job is evicted; an evicted job that
    /// is still running has its cancellation token tripped.
    ///
    /// # Errors
    ///
    /// - `JobError::InvalidRequest` for an unsupported language or an
    ///   out-of-range slide limit
    /// - `JobError::TooManyJobs` when `max_concurrent_jobs` jobs are active
    pub async fn create_job(&self, params: JobParams) -> Result<JobId, JobError> {
        self.validate_params(&params)?;

        let job = Job::new(params);
        let id = job.id;
        let evicted = self
            .store
            .create_admitted(job, self.config.max_concurrent_jobs)
            .await?;

        if let Some(evicted) = evicted {
            tracing::info!(job_id = %evicted.job.id, state = %evicted.job.state, "Evicted oldest job");
            evicted.cancel.cancel();
            self.notifier.forget(evicted.job.id);
        }

        tracing::info!(job_id = %id, "Job created");
        Ok(id)
    }

    fn validate_params(&self, params: &JobParams) -> Result<(), JobError> {
        if !self.config.supports_language(&params.language) {
            return Err(JobError::InvalidRequest(format!(
                "unsupported language {:?}; supported: {}",
                params.language,
                self.config.supported_languages.join(", ")
            )));
        }

        if params.max_slides == 0 || params.max_slides > self.config.max_slides {
            return Err(JobError::InvalidRequest(format!(
                "max_slides must be between 1 and {}",
                self.config.max_slides
            )));
        }

        Ok(())
    }

    /// Snapshot of a job.
    ///
    /// # Errors
    ///
    /// Returns `JobError::NotFound` if no job has this id.
    pub async fn get_status(&self, id: JobId) -> Result<Job, JobError> {
        self.store.get(id).await.ok_or(JobError::NotFound(id))
    }

    /// Result of a completed job.
    ///
    /// # Errors
    ///
    /// - `JobError::NotFound` if no job has this id
    /// - `JobError::NotCompleted` if the job is not Completed
    pub async fn get_result(&self, id: JobId) -> Result<JobResult, JobError> {
        let (state, result) = self
            .store
            .inspect(id, |entry| (entry.job.state, entry.result.clone()))
            .await
            .ok_or(JobError::NotFound(id))?;

        match (state, result) {
            (JobState::Completed, Some(result)) => Ok(result),
            (state, _) => Err(JobError::NotCompleted { id, state }),
        }
    }

    /// Move a Pending job to Processing.
    ///
    /// # Arguments
    ///
    /// * `id` - The job to start
    /// * `slide_numbers` - Deck numbers of the slides to process, in order
    pub async fn start_processing(&self, id: JobId, slide_numbers: &[u32]) {
        let applied = self
            .store
            .update(id, |job| {
                let applied = job::start_processing(job, slide_numbers);
                if applied {
                    self.notifier.publish(JobMessage::progress(job));
                }
                applied
            })
            .await;

        match applied {
            Some(true) => {
                tracing::info!(job_id = %id, total_slides = slide_numbers.len(), "Job processing started");
            }
            _ => tracing::debug!(job_id = %id, "Ignored start of job that is absent or not pending"),
        }
    }

    /// Record overall progress. No-op for absent or terminal jobs.
    pub async fn update_progress(&self, id: JobId, update: ProgressUpdate) {
        let applied = self
            .store
            .update(id, |job| {
                let applied = job::set_progress(job, &update);
                if applied {
                    self.notifier.publish(JobMessage::progress(job));
                }
                applied
            })
            .await;

        if applied != Some(true) {
            tracing::debug!(job_id = %id, percent = update.percent, "Ignored progress update");
        }
    }

    /// Merge sub-state changes into one slide's record.
    ///
    /// No-op if the job or slide is absent or the job is terminal.
    pub async fn update_slide_progress(&self, id: JobId, slide_number: u32, update: SlideUpdate) {
        let applied = self
            .store
            .update(id, |job| {
                let applied = job::apply_slide_update(job, slide_number, &update);
                if applied {
                    self.notifier.publish(JobMessage::progress(job));
                }
                applied
            })
            .await;

        if applied != Some(true) {
            tracing::debug!(job_id = %id, slide_number, "Ignored slide update");
        }
    }

    /// Mark a job Completed and store its result.
    pub async fn complete_job(&self, id: JobId, result: JobResult) {
        let applied = self
            .store
            .update_entry(id, |entry| {
                if !job::complete(&mut entry.job) {
                    return false;
                }
                entry.result = Some(result.clone());
                self.notifier.publish(JobMessage::completed(result));
                true
            })
            .await;

        match applied {
            Some(true) => tracing::info!(job_id = %id, "Job completed"),
            _ => tracing::debug!(job_id = %id, "Ignored completion of absent or terminal job"),
        }
    }

    /// Mark a job Failed and stop its pipeline at the next checkpoint.
    pub async fn fail_job(&self, id: JobId, error: &str) {
        let applied = self
            .store
            .update_entry(id, |entry| {
                if !job::fail(&mut entry.job, error) {
                    return false;
                }
                entry.cancel.cancel();
                self.notifier.publish(JobMessage::error(id, error));
                true
            })
            .await;

        match applied {
            Some(true) => tracing::error!(job_id = %id, error, "Job failed"),
            _ => tracing::debug!(job_id = %id, "Ignored failure of absent or terminal job"),
        }
    }

    /// Request cancellation of a job.
    ///
    /// The job is marked Cancelled immediately; its pipeline stops at the
    /// next slide boundary.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if the job is already terminal and cannot be cancelled.
    ///
    /// # Errors
    ///
    /// Returns `JobError::NotFound` if no job has this id.
    pub async fn cancel_job(&self, id: JobId) -> Result<bool, JobError> {
        let cancelled = self
            .store
            .update_entry(id, |entry| {
                if !job::cancel(&mut entry.job) {
                    return false;
                }
                entry.cancel.cancel();
                self.notifier.publish(JobMessage::cancelled(id));
                true
            })
            .await
            .ok_or(JobError::NotFound(id))?;

        if cancelled {
            tracing::info!(job_id = %id, "Job cancelled");
        } else {
            tracing::debug!(job_id = %id, "Cannot cancel job in terminal state");
        }
        Ok(cancelled)
    }

    /// Whether the job was cancelled by request. False for failed or unknown jobs.
    pub async fn is_cancelled(&self, id: JobId) -> bool {
        self.store
            .inspect(id, |entry| entry.job.state == JobState::Cancelled)
            .await
            .unwrap_or(false)
    }

    /// Cancellation checkpoint for the pipeline.
    ///
    /// Trips for cancelled jobs and also for failed ones, so a run stops
    /// once the watchdog has failed its job.
    ///
    /// # Errors
    ///
    /// - `JobError::Cancelled` if the job's token was tripped
    /// - `JobError::NotFound` if the job has been evicted
    pub async fn check_cancellation(&self, id: JobId) -> Result<(), JobError> {
        match self.store.cancel_token(id).await {
            Some(token) if token.is_cancelled() => Err(JobError::Cancelled(id)),
            Some(_) => Ok(()),
            None => Err(JobError::NotFound(id)),
        }
    }

    /// The token tripped when the job is cancelled, failed or evicted.
    pub async fn cancel_token(&self, id: JobId) -> Option<CancellationToken> {
        self.store.cancel_token(id).await
    }

    /// Subscribe to live updates of a job.
    ///
    /// The subscription starts with a `connected` snapshot.
    ///
    /// # Errors
    ///
    /// Returns `JobError::NotFound` if no job has this id.
    pub async fn subscribe(&self, id: JobId) -> Result<Subscription, JobError> {
        self.store
            .inspect(id, |entry| self.notifier.subscribe(&entry.job))
            .await
            .ok_or(JobError::NotFound(id))
    }

    /// Remove a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: JobId, subscriber_id: SubscriberId) {
        self.notifier.unsubscribe(id, subscriber_id);
    }

    /// Summaries of the `limit` most recent jobs, newest first.
    pub async fn list_jobs(&self, limit: usize) -> Vec<JobSummary> {
        self.store
            .list(limit)
            .await
            .iter()
            .map(Job::summary)
            .collect()
    }

    /// Number of Pending or Processing jobs.
    pub async fn active_count(&self) -> usize {
        self.store.active_count().await
    }

    /// Cancel every active job. Returns how many were cancelled.
    pub async fn cancel_all(&self) -> usize {
        let mut count = 0;
        for (id, _) in self.store.active_tokens().await {
            if matches!(self.cancel_job(id).await, Ok(true)) {
                count += 1;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sc_protocol::job_models::SlideState;
    use uuid::Uuid;

    fn create_test_params() -> JobParams {
        JobParams {
            filename: "deck.pptx".to_string(),
            language: "en".to_string(),
            max_slides: 5,
            generate_video: true,
            generate_quiz: true,
        }
    }

    fn create_test_result(job_id: JobId) -> JobResult {
        JobResult {
            job_id,
            filename: "deck.pptx".to_string(),
            language: "en".to_string(),
            slides: Vec::new(),
            final_video_path: None,
            processing_time_seconds: 1.5,
            created_at: Utc::now(),
            completed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_job_manager_new() {
        let manager = JobManager::new(EngineConfig::default());
        assert_eq!(manager.active_count().await, 0);
        assert!(manager.list_jobs(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_create_and_get_status() {
        let manager = JobManager::new(EngineConfig::default());
        let id = manager.create_job(create_test_params()).await.unwrap();

        let job = manager.get_status(id).await.unwrap();
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.progress, 0);
        assert_eq!(job.params.filename, "deck.pptx");
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let manager = JobManager::new(EngineConfig::default());
        let id = Uuid::new_v4();

        assert_eq!(manager.get_status(id).await, Err(JobError::NotFound(id)));
        assert_eq!(manager.get_result(id).await, Err(JobError::NotFound(id)));
        assert_eq!(manager.cancel_job(id).await, Err(JobError::NotFound(id)));
        assert!(manager.subscribe(id).await.is_err());
        assert!(!manager.is_cancelled(id).await);
    }

    #[tokio::test]
    async fn test_invalid_requests_are_rejected() {
        let manager = JobManager::new(EngineConfig::default());

        let mut params = create_test_params();
        params.language = "de".to_string();
        assert!(matches!(
            manager.create_job(params).await,
            Err(JobError::InvalidRequest(_))
        ));

        let mut params = create_test_params();
        params.max_slides = 11;
        assert!(matches!(
            manager.create_job(params).await,
            Err(JobError::InvalidRequest(_))
        ));

        let mut params = create_test_params();
        params.max_slides = 0;
        assert!(matches!(
            manager.create_job(params).await,
            Err(JobError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_get_result_before_completion() {
        let manager = JobManager::new(EngineConfig::default());
        let id = manager.create_job(create_test_params()).await.unwrap();
        manager.start_processing(id, &[1, 2]).await;

        assert_eq!(
            manager.get_result(id).await,
            Err(JobError::NotCompleted {
                id,
                state: JobState::Processing
            })
        );
    }

    #[tokio::test]
    async fn test_complete_job_stores_result() {
        let manager = JobManager::new(EngineConfig::default());
        let id = manager.create_job(create_test_params()).await.unwrap();
        manager.start_processing(id, &[1]).await;
        manager.complete_job(id, create_test_result(id)).await;

        let job = manager.get_status(id).await.unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.progress, 100);

        let first = manager.get_result(id).await.unwrap();
        let second = manager.get_result(id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fail_job_trips_cancellation() {
        let manager = JobManager::new(EngineConfig::default());
        let id = manager.create_job(create_test_params()).await.unwrap();
        manager.fail_job(id, "Failed to parse presentation: bad zip").await;

        let job = manager.get_status(id).await.unwrap();
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(
            job.error.as_deref(),
            Some("Failed to parse presentation: bad zip")
        );
        assert!(manager.check_cancellation(id).await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_job() {
        let manager = JobManager::new(EngineConfig::default());
        let id = manager.create_job(create_test_params()).await.unwrap();
        manager.start_processing(id, &[1, 2]).await;

        assert!(manager.check_cancellation(id).await.is_ok());
        assert_eq!(manager.cancel_job(id).await, Ok(true));
        assert_eq!(manager.cancel_job(id).await, Ok(false));

        assert!(manager.is_cancelled(id).await);
        assert_eq!(
            manager.check_cancellation(id).await,
            Err(JobError::Cancelled(id))
        );
        assert_eq!(
            manager.get_status(id).await.unwrap().state,
            JobState::Cancelled
        );
    }

    #[tokio::test]
    async fn test_cannot_cancel_completed_job() {
        let manager = JobManager::new(EngineConfig::default());
        let id = manager.create_job(create_test_params()).await.unwrap();
        manager.complete_job(id, create_test_result(id)).await;

        assert_eq!(manager.cancel_job(id).await, Ok(false));
        assert!(!manager.is_cancelled(id).await);
    }

    #[tokio::test]
    async fn test_failed_job_is_not_reported_cancelled() {
        let manager = JobManager::new(EngineConfig::default());
        let id = manager.create_job(create_test_params()).await.unwrap();
        manager.fail_job(id, "Job timed out after 30 minutes").await;

        assert!(!manager.is_cancelled(id).await);
        assert_eq!(
            manager.check_cancellation(id).await,
            Err(JobError::Cancelled(id))
        );
        assert!(!manager.is_cancelled(uuid::Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_mutations_after_cancel_are_ignored() {
        let manager = JobManager::new(EngineConfig::default());
        let id = manager.create_job(create_test_params()).await.unwrap();
        manager.start_processing(id, &[1]).await;
        manager.update_progress(id, ProgressUpdate::new(20)).await;
        manager.cancel_job(id).await.unwrap();

        manager.update_progress(id, ProgressUpdate::new(80)).await;
        manager
            .update_slide_progress(id, 1, SlideUpdate::narration(SlideState::Completed))
            .await;
        manager.complete_job(id, create_test_result(id)).await;

        let job = manager.get_status(id).await.unwrap();
        assert_eq!(job.state, JobState::Cancelled);
        assert_eq!(job.progress, 20);
        assert_eq!(job.slide_progress[0].narration, SlideState::Pending);
        assert!(manager.get_result(id).await.is_err());
    }

    #[tokio::test]
    async fn test_subscribe_sees_connected_then_updates() {
        let manager = JobManager::new(EngineConfig::default());
        let id = manager.create_job(create_test_params()).await.unwrap();
        let mut subscription = manager.subscribe(id).await.unwrap();

        manager.start_processing(id, &[1]).await;
        manager.update_progress(id, ProgressUpdate::new(10).slide(1)).await;
        manager.cancel_job(id).await.unwrap();

        assert!(matches!(subscription.recv().await, Some(JobMessage::Connected { .. })));
        assert!(matches!(subscription.recv().await, Some(JobMessage::Progress { .. })));
        match subscription.recv().await {
            Some(JobMessage::Progress { data, .. }) => {
                assert_eq!(data.progress, 10);
                assert_eq!(data.current_slide, Some(1));
            }
            other => panic!("Expected progress, got {other:?}"),
        }
        assert!(matches!(subscription.recv().await, Some(JobMessage::Cancelled { .. })));
        assert!(subscription.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let manager = JobManager::new(EngineConfig::default());
        let first = manager.create_job(create_test_params()).await.unwrap();
        let second = manager.create_job(create_test_params()).await.unwrap();
        manager.complete_job(second, create_test_result(second)).await;

        assert_eq!(manager.cancel_all().await, 1);
        assert!(manager.is_cancelled(first).await);
        assert_eq!(manager.active_count().await, 0);
    }
}
