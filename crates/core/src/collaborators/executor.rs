//! Common subprocess executor for command-backed collaborators.
//!
//! This module runs a configured external program, feeds it text on stdin
//! and returns its trimmed stdout.

use crate::error::StageError;
use sc_protocol::config_models::CommandSpec;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Values substituted into a command's arguments.
///
/// `{path}`, `{language}`, `{image}` and `{audio}` are replaced inside an
/// argument; an argument that is exactly `{inputs}` expands to one argument
/// per input.
#[derive(Debug, Clone, Copy, Default)]
pub struct Placeholders<'a> {
    pub path: Option<&'a str>,
    pub language: Option<&'a str>,
    pub image: Option<&'a str>,
    pub audio: Option<&'a str>,
    pub inputs: &'a [String],
}

impl Placeholders<'_> {
    /// Expand the placeholders in `args`.
    pub fn expand(&self, args: &[String]) -> Vec<String> {
        let mut expanded = Vec::with_capacity(args.len());
        for arg in args {
            if arg == "{inputs}" {
                expanded.extend(self.inputs.iter().cloned());
                continue;
            }

            let mut arg = arg.clone();
            for (key, value) in [
                ("{path}", self.path),
                ("{language}", self.language),
                ("{image}", self.image),
                ("{audio}", self.audio),
            ] {
                if let Some(value) = value {
                    arg = arg.replace(key, value);
                }
            }
            expanded.push(arg);
        }
        expanded
    }
}

/// Executor for command-backed collaborators.
pub struct CommandExecutor;

impl CommandExecutor {
    /// Whether the program can be found on PATH (or exists, if it is a path).
    pub fn is_available(program: &str) -> bool {
        which::which(program).is_ok()
    }

    /// Run `spec` and return its trimmed stdout.
    ///
    /// # Arguments
    ///
    /// * `spec` - Program and argument template
    /// * `placeholders` - Values substituted into the arguments
    /// * `input` - Text written to stdin, if any
    /// * `failure` - Builds the error for a non-zero exit or unreadable output
    ///
    /// # Errors
    ///
    /// Returns `StageError::Unavailable` if the program cannot be spawned,
    /// and the error built by `failure` if it exits unsuccessfully.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sc_core::collaborators::executor::{CommandExecutor, Placeholders};
    /// use sc_core::error::StageError;
    /// use sc_protocol::config_models::CommandSpec;
    ///
    /// # async fn example() -> Result<(), StageError> {
    /// let spec = CommandSpec {
    ///     program: "narrate".to_string(),
    ///     args: vec!["--lang".to_string(), "{language}".to_string()],
    /// };
    /// let placeholders = Placeholders {
    ///     language: Some("en"),
    ///     ..Placeholders::default()
    /// };
    /// let narration =
    ///     CommandExecutor::run(&spec, &placeholders, Some("Slide text"), StageError::Generation)
    ///         .await?;
    /// println!("{narration}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(
        spec: &CommandSpec,
        placeholders: &Placeholders<'_>,
        input: Option<&str>,
        failure: fn(String) -> StageError,
    ) -> Result<String, StageError> {
        let args = placeholders.expand(&spec.args);
        tracing::debug!(program = %spec.program, ?args, "Running collaborator command");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&args);
        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            StageError::Unavailable(format!("failed to spawn '{}': {}", spec.program, e))
        })?;

        // Feed stdin while stdout is drained, or a child that echoes as it
        // reads blocks on a full pipe. Dropping stdin closes it.
        let stdin = child.stdin.take();
        let feed = async move {
            match (stdin, input) {
                (Some(mut stdin), Some(input)) => stdin.write_all(input.as_bytes()).await,
                _ => Ok(()),
            }
        };

        let (written, output) = tokio::join!(feed, child.wait_with_output());
        let output =
            output.map_err(|e| failure(format!("failed to wait for '{}': {}", spec.program, e)))?;

        // A child may exit without reading all of its input.
        if let Some(e) = written.err().filter(|e| e.kind() != ErrorKind::BrokenPipe) {
            return Err(failure(format!("failed to write to '{}': {}", spec.program, e)));
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failure(format!(
                "'{}' exited with {}: {}",
                spec.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| failure(format!("'{}' wrote invalid UTF-8: {}", spec.program, e)))?;
        Ok(stdout.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(program: &str, args: &[&str]) -> CommandSpec {
        CommandSpec {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_expand_placeholders() {
        let inputs = vec!["a.mp4".to_string(), "b.mp4".to_string()];
        let placeholders = Placeholders {
            language: Some("fr"),
            image: Some("/tmp/1.png"),
            inputs: &inputs,
            ..Placeholders::default()
        };

        let args = placeholders.expand(&[
            "--lang={language}".to_string(),
            "{image}".to_string(),
            "{inputs}".to_string(),
            "{audio}".to_string(),
        ]);

        assert_eq!(
            args,
            vec!["--lang=fr", "/tmp/1.png", "a.mp4", "b.mp4", "{audio}"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_pipes_stdin_to_stdout() {
        let output = CommandExecutor::run(
            &spec("cat", &[]),
            &Placeholders::default(),
            Some("  narrated text\n"),
            StageError::Generation,
        )
        .await
        .expect("cat should echo its input");

        assert_eq!(output, "narrated text");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_streams_input_larger_than_pipe_buffer() {
        let input = "slide text ".repeat(48 * 1024);

        let output = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            CommandExecutor::run(
                &spec("cat", &[]),
                &Placeholders::default(),
                Some(&input),
                StageError::Generation,
            ),
        )
        .await
        .expect("cat should not stall on large input")
        .expect("cat should echo its input");

        assert!(input.len() > 512 * 1024);
        assert_eq!(output, input.trim());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_tolerates_child_ignoring_stdin() {
        let input = "x".repeat(256 * 1024);
        let output = CommandExecutor::run(
            &spec("sh", &["-c", "echo done"]),
            &Placeholders::default(),
            Some(&input),
            StageError::Generation,
        )
        .await
        .expect("unread input is not an error");

        assert_eq!(output, "done");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_exit_failure() {
        let result = CommandExecutor::run(
            &spec("sh", &["-c", "echo broken >&2; exit 3"]),
            &Placeholders::default(),
            None,
            StageError::Synthesis,
        )
        .await;

        match result {
            Err(StageError::Synthesis(msg)) => assert!(msg.contains("broken")),
            other => panic!("Expected Synthesis error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_invalid_command() {
        let result = CommandExecutor::run(
            &spec("nonexistent-command-xyz", &[]),
            &Placeholders::default(),
            None,
            StageError::Render,
        )
        .await;

        assert!(matches!(result, Err(StageError::Unavailable(_))));
        assert!(!CommandExecutor::is_available("nonexistent-command-xyz"));
    }
}
