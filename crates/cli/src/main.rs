mod render;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use colored::Colorize;
use sc_core::collaborators::adapters::mock_collaborators;
use sc_core::collaborators::CollaboratorFactory;
use sc_core::config::loader::load_config;
use sc_core::state::notifier::Subscription;
use sc_core::{JobRequest, SlideCast};
use sc_protocol::ipc::JobMessage;
use sc_protocol::job_models::{JobId, JobState};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "slidecast", version, about = "Turn slide decks into narrated videos and quizzes")]
struct Cli {
    /// Directory containing `.slidecast/config.toml`
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Write logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process a deck, stream its progress and print the result as JSON
    Run(RunArgs),
    /// Print the effective configuration and command availability
    Config,
}

#[derive(Args)]
struct RunArgs {
    /// Deck to process
    deck: PathBuf,

    #[arg(long)]
    language: Option<String>,

    #[arg(long)]
    max_slides: Option<usize>,

    /// Skip speech, image and video generation
    #[arg(long)]
    no_video: bool,

    /// Skip quiz generation
    #[arg(long)]
    no_quiz: bool,

    /// Use mock collaborators for everything but extraction
    #[arg(long)]
    dry_run: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "slidecast=info,sc_core=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.json);

    match cli.command {
        Command::Run(args) => run(&cli.root, args).await,
        Command::Config => show_config(&cli.root).await,
    }
}

async fn run(root: &Path, args: RunArgs) -> Result<()> {
    let config = load_config(root).await?;

    let collaborators = if args.dry_run {
        let mut mocks = mock_collaborators(&[]);
        mocks.extractor = CollaboratorFactory::from_config(&config.commands).extractor;
        mocks
    } else {
        CollaboratorFactory::from_config(&config.commands)
    };

    let service = SlideCast::new(&config, collaborators);

    let mut request = JobRequest::new(&args.deck)
        .video(!args.no_video)
        .quiz(!args.no_quiz);
    if let Some(language) = args.language {
        request = request.language(language);
    }
    if let Some(max_slides) = args.max_slides {
        request = request.max_slides(max_slides);
    }

    let job_id = service.submit(request).await?;
    let subscription = service.manager().subscribe(job_id).await?;

    let outcome = follow(&service, job_id, subscription).await;
    service.shutdown().await;
    outcome
}

/// Print progress until the job reaches a terminal state. Ctrl-C cancels it.
async fn follow(service: &SlideCast, job_id: JobId, mut subscription: Subscription) -> Result<()> {
    loop {
        tokio::select! {
            message = subscription.recv() => match message {
                Some(JobMessage::Connected { .. }) => {
                    eprintln!("{} job {job_id}", "started".cyan().bold());
                }
                Some(JobMessage::Progress { data, .. }) => {
                    eprintln!("{}", render::progress_line(&data));
                }
                Some(JobMessage::Completed { .. }) | Some(JobMessage::Error { .. })
                | Some(JobMessage::Cancelled { .. }) | None => {
                    return report(service, job_id).await;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("{}", "cancelling...".yellow());
                service.manager().cancel_job(job_id).await?;
            }
        }
    }
}

/// Print the per-slide summary and the result of a finished job.
async fn report(service: &SlideCast, job_id: JobId) -> Result<()> {
    let manager = service.manager();
    let job = manager.get_status(job_id).await?;

    for slide in &job.slide_progress {
        eprintln!("{}", render::slide_line(slide));
    }

    match job.state {
        JobState::Completed => {
            let result = manager.get_result(job_id).await?;
            eprintln!(
                "{} {} slides in {:.1}s",
                "completed".green().bold(),
                result.slides.len(),
                result.processing_time_seconds
            );
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        JobState::Failed => Err(eyre!(
            "job failed: {}",
            job.error.unwrap_or_else(|| "unknown error".to_string())
        )),
        state => Err(eyre!("job ended as {state}")),
    }
}

async fn show_config(root: &Path) -> Result<()> {
    let config = load_config(root).await?;

    let effective = serde_json::json!({
        "engine": config.engine,
        "commands": config.commands,
    });
    println!("{}", serde_json::to_string_pretty(&effective)?);

    println!();
    for status in CollaboratorFactory::check_availability(&config.commands) {
        println!("{}", render::status_line(&status));
    }
    Ok(())
}
