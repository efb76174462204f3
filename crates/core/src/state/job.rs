//! Job state machine implementation.
//!
//! This module provides the transitions that the job manager applies to a
//! stored `Job`. Each function mutates the record in place and returns
//! whether the transition was applied; a `false` return leaves the job
//! untouched. Terminal jobs accept no further changes.
//!
//! ```text
//! Pending    --start_processing--> Processing
//! Processing --set_progress/apply_slide_update--> Processing
//! Pending|Processing --complete--> Completed
//! Pending|Processing --fail--> Failed
//! Pending|Processing --cancel--> Cancelled
//! ```

use chrono::Utc;
use sc_protocol::job_models::{Job, JobState, SlideProgress, SlideState, SlideUpdate};

/// Progress report for a job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Requested percentage. Clamped to 0..=100.
    pub percent: i32,
    pub current_slide: Option<u32>,
    pub step: Option<String>,
}

impl ProgressUpdate {
    pub fn new(percent: i32) -> Self {
        Self {
            percent,
            ..Self::default()
        }
    }

    pub fn slide(mut self, slide_number: u32) -> Self {
        self.current_slide = Some(slide_number);
        self
    }

    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }
}

fn touch(job: &mut Job) {
    job.updated_at = Utc::now();
}

fn finish(job: &mut Job, state: JobState, step: &str) {
    let now = Utc::now();
    job.state = state;
    job.current_step = Some(step.to_string());
    job.updated_at = now;
    job.completed_at = Some(now);
}

/// Move a Pending job to Processing with one progress record per slide.
///
/// `slide_numbers` keeps the deck's own numbering, which may have gaps.
pub fn start_processing(job: &mut Job, slide_numbers: &[u32]) -> bool {
    if job.state != JobState::Pending {
        return false;
    }

    job.state = JobState::Processing;
    job.total_slides = Some(slide_numbers.len());
    job.slide_progress = slide_numbers
        .iter()
        .map(|&number| SlideProgress::new(number))
        .collect();
    job.current_step = Some("Processing slides".to_string());
    touch(job);
    true
}

/// Apply a progress report to an active job.
///
/// The percentage never moves backwards; a lower value only updates the
/// current slide and step.
pub fn set_progress(job: &mut Job, update: &ProgressUpdate) -> bool {
    if job.state.is_terminal() {
        return false;
    }

    let percent = update.percent.clamp(0, 100) as u8;
    job.progress = job.progress.max(percent);
    if let Some(slide) = update.current_slide {
        job.current_slide = Some(slide);
    }
    if let Some(step) = &update.step {
        job.current_step = Some(step.clone());
    }
    touch(job);
    true
}

fn advance(current: &mut SlideState, next: Option<SlideState>) {
    if let Some(next) = next {
        if current.can_advance_to(next) {
            *current = next;
        }
    }
}

/// Merge the supplied sub-states into one slide's record.
///
/// Returns false if the job is terminal or has no slide with this number.
/// A sub-state that would regress is left as it is.
pub fn apply_slide_update(job: &mut Job, slide_number: u32, update: &SlideUpdate) -> bool {
    if job.state.is_terminal() {
        return false;
    }

    let Some(slide) = job.slide_mut(slide_number) else {
        return false;
    };

    merge_slide(slide, update);
    touch(job);
    true
}

/// Merge `update` into a slide record, skipping sub-states that would regress.
pub fn merge_slide(slide: &mut SlideProgress, update: &SlideUpdate) {
    advance(&mut slide.narration, update.narration);
    advance(&mut slide.quiz, update.quiz);
    advance(&mut slide.video, update.video);
    if let Some(error) = &update.error {
        slide.error = Some(error.clone());
    }
}

/// Mark the job Completed with full progress.
pub fn complete(job: &mut Job) -> bool {
    if job.state.is_terminal() {
        return false;
    }

    job.progress = 100;
    finish(job, JobState::Completed, "Completed");
    true
}

/// Mark the job Failed and record the error.
pub fn fail(job: &mut Job, error: &str) -> bool {
    if job.state.is_terminal() {
        return false;
    }

    job.error = Some(error.to_string());
    finish(job, JobState::Failed, "Failed");
    true
}

/// Mark the job Cancelled.
pub fn cancel(job: &mut Job) -> bool {
    if job.state.is_terminal() {
        return false;
    }

    finish(job, JobState::Cancelled, "Cancelled");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_protocol::job_models::JobParams;

    fn create_test_job() -> Job {
        Job::new(JobParams {
            filename: "deck.pptx".to_string(),
            language: "en".to_string(),
            max_slides: 10,
            generate_video: true,
            generate_quiz: true,
        })
    }

    fn processing_job(slides: &[u32]) -> Job {
        let mut job = create_test_job();
        assert!(start_processing(&mut job, slides));
        job
    }

    #[test]
    fn test_start_processing_keeps_deck_numbering() {
        let job = processing_job(&[1, 3, 7]);

        assert_eq!(job.state, JobState::Processing);
        assert_eq!(job.total_slides, Some(3));
        let numbers: Vec<u32> = job.slide_progress.iter().map(|s| s.slide_number).collect();
        assert_eq!(numbers, vec![1, 3, 7]);
        assert!(job
            .slide_progress
            .iter()
            .all(|s| s.narration == SlideState::Pending && s.error.is_none()));
    }

    #[test]
    fn test_start_processing_only_from_pending() {
        let mut job = processing_job(&[1]);
        assert!(!start_processing(&mut job, &[1, 2]));
        assert_eq!(job.total_slides, Some(1));
    }

    #[test]
    fn test_progress_is_clamped_and_monotonic() {
        let mut job = processing_job(&[1, 2]);

        assert!(set_progress(&mut job, &ProgressUpdate::new(150)));
        assert_eq!(job.progress, 100);

        let mut job = processing_job(&[1, 2]);
        set_progress(&mut job, &ProgressUpdate::new(-5));
        assert_eq!(job.progress, 0);

        set_progress(&mut job, &ProgressUpdate::new(50).slide(2).step("Generating narration"));
        set_progress(&mut job, &ProgressUpdate::new(30).step("Generating quiz"));
        assert_eq!(job.progress, 50);
        assert_eq!(job.current_slide, Some(2));
        assert_eq!(job.current_step.as_deref(), Some("Generating quiz"));
    }

    #[test]
    fn test_slide_update_merges_supplied_fields() {
        let mut job = processing_job(&[4, 9]);

        assert!(apply_slide_update(
            &mut job,
            9,
            &SlideUpdate::narration(SlideState::Processing)
        ));
        assert!(apply_slide_update(
            &mut job,
            9,
            &SlideUpdate::quiz(SlideState::Failed).with_error("bad quiz")
        ));

        let slide = &job.slide_progress[1];
        assert_eq!(slide.narration, SlideState::Processing);
        assert_eq!(slide.quiz, SlideState::Failed);
        assert_eq!(slide.video, SlideState::Pending);
        assert_eq!(slide.error.as_deref(), Some("bad quiz"));
        assert_eq!(job.slide_progress[0], SlideProgress::new(4));
    }

    #[test]
    fn test_slide_update_never_regresses() {
        let mut job = processing_job(&[1]);
        apply_slide_update(&mut job, 1, &SlideUpdate::narration(SlideState::Completed));
        apply_slide_update(&mut job, 1, &SlideUpdate::narration(SlideState::Pending));
        apply_slide_update(&mut job, 1, &SlideUpdate::narration(SlideState::Failed));

        assert_eq!(job.slide_progress[0].narration, SlideState::Completed);
    }

    #[test]
    fn test_slide_update_unknown_slide_is_ignored() {
        let mut job = processing_job(&[1]);
        assert!(!apply_slide_update(
            &mut job,
            2,
            &SlideUpdate::narration(SlideState::Processing)
        ));
    }

    #[test]
    fn test_complete_sets_progress_and_timestamp() {
        let mut job = processing_job(&[1]);
        assert!(complete(&mut job));

        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn test_pending_job_can_complete_or_fail() {
        let mut job = create_test_job();
        assert!(complete(&mut job));

        let mut job = create_test_job();
        assert!(fail(&mut job, "Failed to parse presentation: bad zip"));
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(
            job.error.as_deref(),
            Some("Failed to parse presentation: bad zip")
        );
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut job = processing_job(&[1]);
        assert!(cancel(&mut job));
        let completed_at = job.completed_at;

        assert!(!complete(&mut job));
        assert!(!fail(&mut job, "late"));
        assert!(!cancel(&mut job));
        assert!(!set_progress(&mut job, &ProgressUpdate::new(90)));
        assert!(!apply_slide_update(
            &mut job,
            1,
            &SlideUpdate::narration(SlideState::Completed)
        ));

        assert_eq!(job.state, JobState::Cancelled);
        assert_eq!(job.completed_at, completed_at);
        assert!(job.error.is_none());
        assert_eq!(job.slide_progress[0].narration, SlideState::Pending);
    }
}
