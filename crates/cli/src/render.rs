//! Terminal rendering of job progress.

use colored::Colorize;
use sc_core::collaborators::factory::CommandStatus;
use sc_protocol::ipc::ProgressData;
use sc_protocol::job_models::{SlideProgress, SlideState};

pub fn progress_line(data: &ProgressData) -> String {
    let percent = format!("[{:>3}%]", data.progress);
    let slide = data
        .current_slide
        .map(|n| format!(" slide {n}"))
        .unwrap_or_default();
    let step = data.current_step.as_deref().unwrap_or("Working");

    format!("{}{slide} {step}", percent.cyan())
}

fn state_label(state: SlideState) -> String {
    match state {
        SlideState::Completed => state.as_str().green().to_string(),
        SlideState::Failed => state.as_str().red().to_string(),
        SlideState::Processing => state.as_str().yellow().to_string(),
        SlideState::Pending => state.as_str().dimmed().to_string(),
    }
}

pub fn slide_line(slide: &SlideProgress) -> String {
    let mut line = format!(
        "slide {:>3}  narration={} quiz={} video={}",
        slide.slide_number,
        state_label(slide.narration),
        state_label(slide.quiz),
        state_label(slide.video),
    );
    if let Some(error) = &slide.error {
        line.push_str(&format!("  ({error})"));
    }
    line
}

pub fn status_line(status: &CommandStatus) -> String {
    let program = status.program.as_deref().unwrap_or("-");
    let mark = match (&status.program, status.available) {
        (None, _) => "not configured".dimmed(),
        (Some(_), true) => "available".green(),
        (Some(_), false) => "missing".red(),
    };
    format!("{:<10} {program:<24} {mark}", status.stage)
}
