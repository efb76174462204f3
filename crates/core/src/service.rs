//! Orchestration context tying the job manager, engine and worker pool together.
//!
//! A [`SlideCast`] is built once at startup and passed to whatever serves
//! callers. Each submitted job runs in its own task, next to a watchdog
//! that fails the job once its time budget is spent.

use crate::collaborators::base::Collaborators;
use crate::config::models::AppConfig;
use crate::engine::pool::WorkerPool;
use crate::engine::PipelineEngine;
use crate::error::JobError;
use crate::state::manager::JobManager;
use sc_protocol::job_models::{JobId, JobParams};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// A deck submitted for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    /// Path handed to the extraction collaborator.
    pub deck: PathBuf,
    /// Defaults to the configured language.
    pub language: Option<String>,
    /// Defaults to the configured maximum.
    pub max_slides: Option<usize>,
    pub generate_video: bool,
    pub generate_quiz: bool,
}

impl JobRequest {
    pub fn new(deck: impl Into<PathBuf>) -> Self {
        Self {
            deck: deck.into(),
            language: None,
            max_slides: None,
            generate_video: true,
            generate_quiz: true,
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn max_slides(mut self, max_slides: usize) -> Self {
        self.max_slides = Some(max_slides);
        self
    }

    pub fn video(mut self, enabled: bool) -> Self {
        self.generate_video = enabled;
        self
    }

    pub fn quiz(mut self, enabled: bool) -> Self {
        self.generate_quiz = enabled;
        self
    }
}

/// The orchestration context.
pub struct SlideCast {
    manager: Arc<JobManager>,
    engine: Arc<PipelineEngine>,
    job_timeout: Duration,
    tasks: TaskTracker,
    shutdown: CancellationToken,
}

impl SlideCast {
    /// Build the context. Must be called inside a Tokio runtime.
    pub fn new(config: &AppConfig, collaborators: Collaborators) -> Self {
        let manager = Arc::new(JobManager::new(config.engine.clone()));
        let pool = WorkerPool::new(config.engine.worker_threads);
        let engine = Arc::new(PipelineEngine::new(
            Arc::clone(&manager),
            collaborators,
            pool,
        ));

        Self {
            manager,
            engine,
            job_timeout: Duration::from_secs(config.engine.job_timeout_minutes.saturating_mul(60)),
            tasks: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Override the per-job time budget.
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    /// The job manager, for status queries, cancellation and subscriptions.
    pub fn manager(&self) -> &Arc<JobManager> {
        &self.manager
    }

    /// Create a job for `request` and start running it in the background.
    ///
    /// # Errors
    ///
    /// Returns the manager's admission and validation errors, or
    /// `JobError::InvalidRequest` once shutdown has begun.
    pub async fn submit(&self, request: JobRequest) -> Result<JobId, JobError> {
        if self.shutdown.is_cancelled() {
            return Err(JobError::InvalidRequest("service is shutting down".to_string()));
        }

        let config = self.manager.config();
        let filename = request
            .deck
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| request.deck.display().to_string());

        let params = JobParams {
            filename,
            language: request
                .language
                .unwrap_or_else(|| config.default_language.clone()),
            max_slides: request.max_slides.unwrap_or(config.max_slides),
            generate_video: request.generate_video,
            generate_quiz: request.generate_quiz,
        };

        let job_id = self.manager.create_job(params).await?;
        let token = self
            .manager
            .cancel_token(job_id)
            .await
            .ok_or(JobError::NotFound(job_id))?;
        let finished = CancellationToken::new();

        self.spawn_watchdog(job_id, token, finished.clone());

        let engine = Arc::clone(&self.engine);
        let deck = request.deck;
        self.tasks.spawn(async move {
            let _ = engine.run(job_id, &deck).await;
            finished.cancel();
        });

        Ok(job_id)
    }

    /// Fail the job if it is still running when its budget runs out.
    ///
    /// The pipeline is not interrupted; failing the job trips its token so
    /// the run stops at the next slide boundary.
    fn spawn_watchdog(&self, job_id: JobId, token: CancellationToken, finished: CancellationToken) {
        let manager = Arc::clone(&self.manager);
        let timeout = self.job_timeout;

        self.tasks.spawn(async move {
            tokio::select! {
                _ = finished.cancelled() => {}
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    let minutes = timeout.as_secs() / 60;
                    tracing::warn!(job_id = %job_id, minutes, "Job exceeded its time budget");
                    manager
                        .fail_job(job_id, &format!("Job timed out after {minutes} minutes"))
                        .await;
                }
            }
        });
    }

    /// Cancel all active jobs and wait for their tasks to stop.
    ///
    /// In-flight slides finish before their job stops.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let cancelled = self.manager.cancel_all().await;
        tracing::info!(cancelled, "Shutting down");

        self.tasks.close();
        self.tasks.wait().await;
        self.manager.notifier().shutdown();
    }
}
