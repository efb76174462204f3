//! Configuration models for `.slidecast/config.toml`.
//!
//! This module defines the engine limits and the optional external commands
//! that back each pipeline collaborator.

use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

/// Engine limits and defaults.
///
/// # Example
///
/// ```toml
/// # .slidecast/config.toml
/// max_concurrent_jobs = 3
/// max_jobs = 100
/// max_slides = 10
/// job_timeout_minutes = 30
/// worker_threads = 4
/// default_language = "en"
/// supported_languages = ["en", "fr", "hi"]
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of Pending or Processing jobs admitted at once.
    pub max_concurrent_jobs: usize,

    /// Capacity of the job store. The oldest job is evicted beyond it.
    pub max_jobs: usize,

    /// Upper bound for a job's `max_slides` parameter.
    pub max_slides: usize,

    /// Budget after which the watchdog fails a job that is still active.
    pub job_timeout_minutes: u64,

    /// Size of the pool running speech, image and video work.
    pub worker_threads: usize,

    pub default_language: String,

    pub supported_languages: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 3,
            max_jobs: 100,
            max_slides: 10,
            job_timeout_minutes: 30,
            worker_threads: 4,
            default_language: "en".to_string(),
            supported_languages: vec!["en".to_string(), "fr".to_string(), "hi".to_string()],
        }
    }
}

impl EngineConfig {
    pub fn supports_language(&self, language: &str) -> bool {
        self.supported_languages.iter().any(|l| l == language)
    }
}

/// An external program invocation.
///
/// Arguments may contain the placeholders `{path}`, `{language}`, `{image}`,
/// `{audio}` and `{inputs}`; `{inputs}` expands to one argument per input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// External commands backing the pipeline collaborators.
///
/// # Example
///
/// ```toml
/// [commands.narrate]
/// program = "narrate"
/// args = ["--lang", "{language}"]
///
/// [commands.stitch]
/// program = "concat-videos"
/// args = ["{inputs}"]
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
#[serde(default)]
pub struct CommandConfig {
    pub extract: Option<CommandSpec>,
    pub narrate: Option<CommandSpec>,
    pub quiz: Option<CommandSpec>,
    pub speech: Option<CommandSpec>,
    pub image: Option<CommandSpec>,
    pub assemble: Option<CommandSpec>,
    pub stitch: Option<CommandSpec>,
}

/// Top-level shape of `config.toml`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct GlobalConfig {
    #[serde(flatten)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub commands: CommandConfig,
}
