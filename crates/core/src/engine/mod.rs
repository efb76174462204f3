//! Pipeline execution engine.
//!
//! The PipelineEngine drives one job through its slides, reporting every
//! step back through the [`JobManager`]. Per-slide failures are recorded on
//! the slide and never abort the job; anything escaping the slide loop fails
//! the job, except cancellation which stops it silently.

pub mod pool;
pub mod quiz;

use crate::collaborators::base::{Collaborators, ExtractedSlide};
use crate::error::{PipelineError, StageError};
use crate::state::job::{merge_slide, ProgressUpdate};
use crate::state::manager::JobManager;
use chrono::Utc;
use pool::WorkerPool;
use sc_protocol::job_models::{JobId, JobParams, SlideProgress, SlideState, SlideUpdate};
use sc_protocol::result_models::{JobResult, SlideResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Progress reserved before the first slide.
const SLIDES_START: usize = 10;
/// Progress shared by all slides.
const SLIDES_SPAN: usize = 80;
const PARSING_PROGRESS: i32 = 5;
const STITCHING_PROGRESS: i32 = 95;

/// Progress window of one slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SlideWindow {
    base: usize,
    share: usize,
}

impl SlideWindow {
    fn new(index: usize, total: usize) -> Self {
        let base = SLIDES_START + index * SLIDES_SPAN / total;
        let next = SLIDES_START + (index + 1) * SLIDES_SPAN / total;
        Self {
            base,
            share: next - base,
        }
    }

    /// Progress at sub-step `k` of 4 inside the window.
    fn at(&self, k: usize) -> i32 {
        (self.base + self.share * k / 4) as i32
    }
}

/// Tracks one slide's sub-states locally and mirrors every change to the manager.
struct SlideRun<'a> {
    manager: &'a JobManager,
    job_id: JobId,
    progress: SlideProgress,
}

impl<'a> SlideRun<'a> {
    fn new(manager: &'a JobManager, job_id: JobId, slide_number: u32) -> Self {
        Self {
            manager,
            job_id,
            progress: SlideProgress::new(slide_number),
        }
    }

    fn number(&self) -> u32 {
        self.progress.slide_number
    }

    async fn set(&mut self, update: SlideUpdate) {
        merge_slide(&mut self.progress, &update);
        self.manager
            .update_slide_progress(self.job_id, self.number(), update)
            .await;
    }

    async fn report(&self, percent: i32, step: String) {
        self.manager
            .update_progress(
                self.job_id,
                ProgressUpdate::new(percent).slide(self.number()).step(step),
            )
            .await;
    }

    /// Mark every enabled stage that has not finished as Failed.
    async fn fail_unfinished(&mut self, params: &JobParams, error: &StageError) {
        let unfinished = |state: SlideState| {
            matches!(state, SlideState::Pending | SlideState::Processing).then_some(SlideState::Failed)
        };

        let update = SlideUpdate {
            narration: unfinished(self.progress.narration),
            quiz: unfinished(self.progress.quiz).filter(|_| params.generate_quiz),
            video: unfinished(self.progress.video).filter(|_| params.generate_video),
            error: Some(error.to_string()),
        };
        self.set(update).await;
    }
}

/// The main pipeline execution engine.
///
/// PipelineEngine takes a job id and a deck, runs extraction and the
/// per-slide stages, and finalizes the job with its result.
pub struct PipelineEngine {
    manager: Arc<JobManager>,
    collaborators: Collaborators,
    pool: WorkerPool,
}

impl PipelineEngine {
    /// Create a new PipelineEngine.
    ///
    /// # Arguments
    ///
    /// * `manager` - Receives every state change of the jobs this engine runs
    /// * `collaborators` - External operations invoked for each slide
    /// * `pool` - Workers for speech, image and video work
    pub fn new(manager: Arc<JobManager>, collaborators: Collaborators, pool: WorkerPool) -> Self {
        Self {
            manager,
            collaborators,
            pool,
        }
    }

    pub fn manager(&self) -> &Arc<JobManager> {
        &self.manager
    }

    /// Run a job to the end and record its outcome.
    ///
    /// This is the main entry point for job execution. It:
    /// 1. Extracts the deck and selects slides with text
    /// 2. Starts processing with the deck's slide numbers
    /// 3. Runs narration, quiz and video stages slide by slide
    /// 4. Stitches slide videos into one
    /// 5. Completes the job, or fails it if the run errored
    ///
    /// A cancelled run leaves the job as it is.
    ///
    /// # Arguments
    ///
    /// * `job_id` - A job created through the manager, still Pending
    /// * `deck` - Path handed to the extraction collaborator
    ///
    /// # Errors
    ///
    /// Returns the error that ended the run. It has already been recorded
    /// on the job.
    pub async fn run(&self, job_id: JobId, deck: &Path) -> Result<JobResult, PipelineError> {
        let span = tracing::info_span!("job", job_id = %job_id);
        async {
            tracing::info!(deck = %deck.display(), "Starting job");

            match self.execute(job_id, deck).await {
                Ok(result) => {
                    self.manager.complete_job(job_id, result.clone()).await;
                    Ok(result)
                }
                Err(e) if e.is_cancellation() => {
                    tracing::info!("Job stopped after cancellation");
                    Err(e)
                }
                Err(e) => {
                    self.manager.fail_job(job_id, &e.to_string()).await;
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, job_id: JobId, deck: &Path) -> Result<JobResult, PipelineError> {
        let started = Instant::now();
        let job = self.manager.get_status(job_id).await?;
        let params = job.params;

        self.manager
            .update_progress(
                job_id,
                ProgressUpdate::new(PARSING_PROGRESS).step("Parsing presentation"),
            )
            .await;

        let slides: Vec<ExtractedSlide> = self
            .collaborators
            .extractor
            .extract(deck)
            .await?
            .into_iter()
            .filter(ExtractedSlide::has_text)
            .take(params.max_slides)
            .collect();

        let mut results = Vec::with_capacity(slides.len());
        let mut final_video_path = None;

        if slides.is_empty() {
            tracing::warn!("No slides with text found");
            self.manager.check_cancellation(job_id).await?;
        } else {
            let slide_numbers: Vec<u32> = slides.iter().map(|s| s.slide_number).collect();
            self.manager.start_processing(job_id, &slide_numbers).await;
            tracing::info!(total_slides = slides.len(), ?slide_numbers, "Processing slides");

            for (index, slide) in slides.iter().enumerate() {
                self.manager.check_cancellation(job_id).await?;

                let window = SlideWindow::new(index, slides.len());
                let result = self.process_slide(job_id, &params, slide, window).await;
                results.push(result);
            }

            self.manager.check_cancellation(job_id).await?;

            let videos: Vec<String> = results
                .iter()
                .filter_map(|r: &SlideResult| r.video_path.clone())
                .collect();
            if !videos.is_empty() {
                final_video_path = self.stitch(job_id, videos).await;
            }
        }

        Ok(JobResult {
            job_id,
            filename: params.filename,
            language: params.language,
            slides: results,
            final_video_path,
            processing_time_seconds: started.elapsed().as_secs_f64(),
            created_at: job.created_at,
            completed_at: Utc::now(),
        })
    }

    /// Run every stage of one slide. Never fails; errors land on the slide record.
    async fn process_slide(
        &self,
        job_id: JobId,
        params: &JobParams,
        slide: &ExtractedSlide,
        window: SlideWindow,
    ) -> SlideResult {
        let number = slide.slide_number;
        let mut run = SlideRun::new(&self.manager, job_id, number);
        let mut result = SlideResult::new(number, slide.text.clone());

        run.report(window.at(0), format!("Processing slide {number}"))
            .await;

        if let Err(e) = self.run_stages(&mut run, params, slide, window, &mut result).await {
            tracing::warn!(slide_number = number, error = %e, "Slide failed");
            run.fail_unfinished(params, &e).await;
        }

        result
    }

    async fn run_stages(
        &self,
        run: &mut SlideRun<'_>,
        params: &JobParams,
        slide: &ExtractedSlide,
        window: SlideWindow,
        result: &mut SlideResult,
    ) -> Result<(), StageError> {
        let number = slide.slide_number;

        run.set(SlideUpdate::narration(SlideState::Processing)).await;
        run.report(window.at(1), format!("Generating narration for slide {number}"))
            .await;

        match self
            .collaborators
            .narrator
            .narrate(&slide.text, &params.language)
            .await
        {
            Ok(narration) => {
                result.narration = Some(narration);
                run.set(SlideUpdate::narration(SlideState::Completed)).await;
            }
            Err(e) => {
                tracing::warn!(slide_number = number, error = %e, "Narration failed");
                run.set(SlideUpdate::narration(SlideState::Failed).with_error(e.to_string()))
                    .await;
            }
        }

        if params.generate_quiz {
            run.set(SlideUpdate::quiz(SlideState::Processing)).await;
            run.report(window.at(2), format!("Generating quiz for slide {number}"))
                .await;

            let quiz = quiz::generate_validated_quiz(
                self.collaborators.quiz_generator.as_ref(),
                self.collaborators.quiz_validator.as_ref(),
                &slide.text,
                &params.language,
            )
            .await?;
            result.quiz = Some(quiz);
            run.set(SlideUpdate::quiz(SlideState::Completed)).await;
        }

        if params.generate_video {
            let Some(narration) = result.narration.clone() else {
                run.set(SlideUpdate::video(SlideState::Failed)).await;
                return Ok(());
            };

            run.set(SlideUpdate::video(SlideState::Processing)).await;
            run.report(window.at(3), format!("Creating video for slide {number}"))
                .await;

            self.render_video(narration, slide.text.clone(), &params.language, result)
                .await?;
            run.set(SlideUpdate::video(SlideState::Completed)).await;
        }

        Ok(())
    }

    /// Synthesize speech and render the image side by side, then assemble.
    async fn render_video(
        &self,
        narration: String,
        text: String,
        language: &str,
        result: &mut SlideResult,
    ) -> Result<(), StageError> {
        let speech = Arc::clone(&self.collaborators.speech);
        let language = language.to_string();
        let audio = self
            .pool
            .run(async move { speech.synthesize(&narration, &language).await });

        let renderer = Arc::clone(&self.collaborators.image);
        let image = self.pool.run(async move { renderer.render(&text).await });

        let (audio, image) = tokio::join!(audio, image);
        let audio = audio?;
        result.audio_path = Some(audio.clone());
        let image = image?;
        result.image_path = Some(image.clone());

        let video = Arc::clone(&self.collaborators.video);
        let video_path = self
            .pool
            .run(async move { video.assemble(&image, &audio).await })
            .await?;
        result.video_path = Some(video_path);
        Ok(())
    }

    /// Best-effort stitching; a failure only leaves the final video absent.
    async fn stitch(&self, job_id: JobId, videos: Vec<String>) -> Option<String> {
        self.manager
            .update_progress(
                job_id,
                ProgressUpdate::new(STITCHING_PROGRESS).step("Stitching final video"),
            )
            .await;

        let count = videos.len();
        let video = Arc::clone(&self.collaborators.video);
        match self.pool.run(async move { video.stitch(&videos).await }).await {
            Ok(path) => {
                tracing::info!(videos = count, "Final video stitched");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stitching failed, continuing without final video");
                None
            }
        }
    }
}
