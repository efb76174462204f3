//! Fixtures for managers, job parameters and results.

use chrono::Utc;
use sc_core::collaborators::base::Collaborators;
use sc_core::engine::pool::WorkerPool;
use sc_core::engine::PipelineEngine;
use sc_core::state::manager::JobManager;
use sc_protocol::config_models::EngineConfig;
use sc_protocol::job_models::{JobId, JobParams};
use sc_protocol::result_models::JobResult;
use std::sync::Arc;

/// Engine config with the given admission limit and store capacity.
#[allow(dead_code)]
pub fn engine_config(max_concurrent_jobs: usize, max_jobs: usize) -> EngineConfig {
    EngineConfig {
        max_concurrent_jobs,
        max_jobs,
        ..EngineConfig::default()
    }
}

#[allow(dead_code)]
pub fn job_params(filename: &str) -> JobParams {
    JobParams {
        filename: filename.to_string(),
        language: "en".to_string(),
        max_slides: 10,
        generate_video: true,
        generate_quiz: true,
    }
}

/// A result with no slides, as produced for an empty deck.
#[allow(dead_code)]
pub fn empty_result(job_id: JobId, filename: &str) -> JobResult {
    let now = Utc::now();
    JobResult {
        job_id,
        filename: filename.to_string(),
        language: "en".to_string(),
        slides: Vec::new(),
        final_video_path: None,
        processing_time_seconds: 0.0,
        created_at: now,
        completed_at: now,
    }
}

/// An engine over a fresh manager with default limits.
#[allow(dead_code)]
pub fn create_engine(collaborators: Collaborators) -> Arc<PipelineEngine> {
    let manager = Arc::new(JobManager::new(EngineConfig::default()));
    Arc::new(PipelineEngine::new(manager, collaborators, WorkerPool::new(2)))
}
