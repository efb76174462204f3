//! Integration tests for the job manager.
//!
//! These tests verify that the JobManager correctly:
//! - Admits at most `max_concurrent_jobs` active jobs
//! - Evicts the oldest job once the store is full
//! - Cancels jobs and tells their subscribers
//! - Serves results only for completed jobs

mod common;

use common::*;
use sc_core::error::JobError;
use sc_core::state::manager::JobManager;
use sc_protocol::ipc::JobMessage;
use sc_protocol::job_models::JobState;

#[tokio::test]
async fn test_admission_frees_slot_when_job_terminates() {
    let manager = JobManager::new(engine_config(2, 100));

    let first = manager.create_job(job_params("a.pptx")).await.unwrap();
    manager.create_job(job_params("b.pptx")).await.unwrap();

    let rejected = manager.create_job(job_params("c.pptx")).await;
    assert!(matches!(rejected, Err(JobError::TooManyJobs { max: 2 })));

    manager.fail_job(first, "Failed to parse presentation").await;
    assert_eq!(manager.active_count().await, 1);

    manager
        .create_job(job_params("c.pptx"))
        .await
        .expect("a slot should be free after a job fails");
}

#[tokio::test]
async fn test_store_evicts_oldest_job() {
    let manager = JobManager::new(engine_config(3, 2));

    let oldest = manager.create_job(job_params("a.pptx")).await.unwrap();
    manager.complete_job(oldest, empty_result(oldest, "a.pptx")).await;
    let second = manager.create_job(job_params("b.pptx")).await.unwrap();
    let third = manager.create_job(job_params("c.pptx")).await.unwrap();

    assert!(matches!(
        manager.get_status(oldest).await,
        Err(JobError::NotFound(id)) if id == oldest
    ));
    assert!(matches!(
        manager.get_result(oldest).await,
        Err(JobError::NotFound(_))
    ));

    let listed: Vec<_> = manager.list_jobs(10).await.iter().map(|s| s.id).collect();
    assert_eq!(listed, vec![third, second]);
}

#[tokio::test]
async fn test_evicting_active_job_trips_its_token() {
    let manager = JobManager::new(engine_config(3, 2));

    let oldest = manager.create_job(job_params("a.pptx")).await.unwrap();
    let token = manager.cancel_token(oldest).await.unwrap();
    manager.create_job(job_params("b.pptx")).await.unwrap();
    manager.create_job(job_params("c.pptx")).await.unwrap();

    assert!(token.is_cancelled());
    assert!(matches!(
        manager.check_cancellation(oldest).await,
        Err(JobError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_cancel_notifies_subscribers_once() {
    let manager = JobManager::new(engine_config(3, 100));
    let id = manager.create_job(job_params("deck.pptx")).await.unwrap();
    let mut subscription = manager.subscribe(id).await.unwrap();

    assert!(manager.cancel_job(id).await.unwrap());
    assert!(!manager.cancel_job(id).await.unwrap());

    let messages = collect_until_terminal(&mut subscription).await;
    assert_message_sequence(&messages);
    assert!(matches!(messages.last(), Some(JobMessage::Cancelled { .. })));

    let job = manager.get_status(id).await.unwrap();
    assert_eq!(job.state, JobState::Cancelled);
    assert!(manager.is_cancelled(id).await);
    assert!(matches!(
        manager.get_result(id).await,
        Err(JobError::NotCompleted { state: JobState::Cancelled, .. })
    ));
}

#[tokio::test]
async fn test_cancel_unknown_job_is_not_found() {
    let manager = JobManager::new(engine_config(3, 100));
    let unknown = uuid::Uuid::new_v4();

    assert!(matches!(
        manager.cancel_job(unknown).await,
        Err(JobError::NotFound(_))
    ));
    assert!(matches!(
        manager.subscribe(unknown).await,
        Err(JobError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_get_result_is_repeatable() {
    let manager = JobManager::new(engine_config(3, 100));
    let id = manager.create_job(job_params("deck.pptx")).await.unwrap();

    assert!(matches!(
        manager.get_result(id).await,
        Err(JobError::NotCompleted { state: JobState::Pending, .. })
    ));

    manager.complete_job(id, empty_result(id, "deck.pptx")).await;

    let first = manager.get_result(id).await.unwrap();
    let second = manager.get_result(id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.job_id, id);
}

#[tokio::test]
async fn test_late_subscriber_to_finished_job_gets_snapshot_only() {
    let manager = JobManager::new(engine_config(3, 100));
    let id = manager.create_job(job_params("deck.pptx")).await.unwrap();
    manager.complete_job(id, empty_result(id, "deck.pptx")).await;

    let mut subscription = manager.subscribe(id).await.unwrap();
    match subscription.recv().await {
        Some(JobMessage::Connected { data, .. }) => {
            assert_eq!(data.state, JobState::Completed);
            assert_eq!(data.progress, 100);
        }
        other => panic!("expected Connected, got {other:?}"),
    }
    assert!(subscription.recv().await.is_none());
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let manager = JobManager::new(engine_config(3, 100));

    let mut params = job_params("deck.pptx");
    params.language = "de".to_string();
    assert!(matches!(
        manager.create_job(params).await,
        Err(JobError::InvalidRequest(_))
    ));

    let mut params = job_params("deck.pptx");
    params.max_slides = 0;
    assert!(matches!(
        manager.create_job(params).await,
        Err(JobError::InvalidRequest(_))
    ));

    assert_eq!(manager.list_jobs(10).await.len(), 0);
}
