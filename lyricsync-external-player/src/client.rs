//! Shell-command client for the external player.

use crate::config::{ExternalPlayerConfig, POSITION_PLACEHOLDER};
use crate::error::{ExternalPlayerError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// What the external player reports about its current track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalPosition {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    /// Track length in seconds
    pub time: f64,
    /// Playback position in seconds
    pub position: f64,
}

/// Query/seek contract of an external media player
#[async_trait]
pub trait PlayerQuery: Send + Sync {
    /// Current track and position, or `None` when nothing is playing.
    ///
    /// # Errors
    ///
    /// Returns an error if the player cannot be reached or answers garbage.
    async fn query_position(&self) -> Result<Option<ExternalPosition>>;

    /// Move the player to `position` seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the seek command fails.
    async fn seek_to(&self, position: f64) -> Result<()>;
}

/// Parse query output: JSON position, `null`, or nothing
fn parse_position(stdout: &str) -> Result<Option<ExternalPosition>> {
    let stdout = stdout.trim();
    if stdout.is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str(stdout)?)
}

/// Arguments with every `{position}` placeholder filled in
fn seek_args(template: &[String], position: f64) -> Vec<String> {
    let position = format!("{position:.3}");
    template
        .iter()
        .map(|arg| arg.replace(POSITION_PLACEHOLDER, &position))
        .collect()
}

/// [`PlayerQuery`] that runs the configured shell commands
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    query_command: Vec<String>,
    seek_command: Vec<String>,
    timeout: Duration,
}

impl CommandPlayer {
    #[must_use]
    pub fn new(config: &ExternalPlayerConfig) -> Self {
        Self {
            query_command: config.query_command.clone(),
            seek_command: config.seek_command.clone(),
            timeout: Duration::from_millis(config.command_timeout_ms),
        }
    }

    /// Run a command line and return its stdout
    async fn run(&self, which: &'static str, args: &[String]) -> Result<String> {
        let Some((program, rest)) = args.split_first() else {
            return Err(ExternalPlayerError::CommandNotConfigured { which });
        };

        let output = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| ExternalPlayerError::Timeout {
                program: program.clone(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })?
            .map_err(|source| ExternalPlayerError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExternalPlayerError::CommandFailed {
                program: program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl PlayerQuery for CommandPlayer {
    async fn query_position(&self) -> Result<Option<ExternalPosition>> {
        let stdout = self.run("query", &self.query_command).await?;
        parse_position(&stdout)
    }

    async fn seek_to(&self, position: f64) -> Result<()> {
        let args = seek_args(&self.seek_command, position);
        debug!("Seeking external player to {:.3}s", position);
        self.run("seek", &args).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(query: &[&str], seek: &[&str]) -> ExternalPlayerConfig {
        ExternalPlayerConfig {
            query_command: query.iter().map(ToString::to_string).collect(),
            seek_command: seek.iter().map(ToString::to_string).collect(),
            poll_interval_ms: 500,
            command_timeout_ms: 2000,
        }
    }

    #[test]
    fn test_parse_position_json() {
        let parsed = parse_position(
            r#"{"title": "Song", "artist": "Band", "time": 200.5, "position": 12.25}"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(parsed.title, "Song");
        assert_eq!(parsed.artist, "Band");
        assert!((parsed.time - 200.5).abs() < f64::EPSILON);
        assert!((parsed.position - 12.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_position_idle() {
        assert_eq!(parse_position("null\n").unwrap(), None);
        assert_eq!(parse_position("  ").unwrap(), None);
    }

    #[test]
    fn test_parse_position_missing_artist_defaults_empty() {
        let parsed = parse_position(r#"{"title": "Song", "time": 1, "position": 0}"#)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.artist, "");
    }

    #[test]
    fn test_parse_position_garbage() {
        assert!(matches!(
            parse_position("error: player not running"),
            Err(ExternalPlayerError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_seek_args_substitutes_position() {
        let template = vec!["ctl".to_string(), "--to={position}".to_string()];
        assert_eq!(seek_args(&template, 12.5), vec!["ctl", "--to=12.500"]);
    }

    #[tokio::test]
    async fn test_empty_command_not_configured() {
        let player = CommandPlayer::new(&config(&[], &[]));
        assert!(matches!(
            player.query_position().await,
            Err(ExternalPlayerError::CommandNotConfigured { which: "query" })
        ));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let player = CommandPlayer::new(&config(&["lyricsync-no-such-program"], &[]));
        assert!(matches!(
            player.query_position().await,
            Err(ExternalPlayerError::Spawn { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_query_runs_command() {
        let player = CommandPlayer::new(&config(
            &[
                "sh",
                "-c",
                r#"echo '{"title":"Song","artist":"Band","time":100,"position":5}'"#,
            ],
            &["sh", "-c", "exit 0", "{position}"],
        ));

        let position = player.query_position().await.unwrap().unwrap();
        assert_eq!(position.title, "Song");
        player.seek_to(3.0).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_reports_stderr() {
        let player = CommandPlayer::new(&config(&["sh", "-c", "echo nope >&2; exit 3"], &[]));
        let err = player.query_position().await.unwrap_err();
        assert!(matches!(err, ExternalPlayerError::CommandFailed { ref stderr, .. } if stderr == "nope"));
    }
}
