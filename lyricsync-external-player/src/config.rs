//! External player source configuration.

use const_format::concatcp;
use lyricsync_core::{CoreError, SourceKind, SourcesConfig};
use serde::{Deserialize, Serialize};

/// Source name used in config file
pub const PROVIDER_NAME: &str = SourceKind::ExternalPlayer.as_str();

/// Placeholder replaced by the target position (seconds) in `seek_command`
pub const POSITION_PLACEHOLDER: &str = "{position}";

const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 2000;

/// External player configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalPlayerConfig {
    /// Program and arguments printing `{"title", "artist", "time", "position"}` JSON or `null`
    #[serde(default)]
    pub query_command: Vec<String>,
    /// Program and arguments moving playback; `{position}` is substituted
    #[serde(default)]
    pub seek_command: Vec<String>,
    /// Polling interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Commands running longer than this are killed
    #[serde(default = "default_command_timeout")]
    pub command_timeout_ms: u64,
}

const fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

const fn default_command_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_MS
}

impl ExternalPlayerConfig {
    /// Extract the external player table from the dynamic sources config.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be parsed.
    pub fn from_sources(sources: &SourcesConfig) -> Result<Option<Self>, CoreError> {
        sources.get(PROVIDER_NAME)
    }

    /// Validate that the commands are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if a command is missing or an interval is zero.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.query_command.first().map_or(true, |p| p.trim().is_empty()) {
            return Err(CoreError::ConfigMissingField {
                field: "sources.external_player.query_command".into(),
            });
        }
        if self.seek_command.first().map_or(true, |p| p.trim().is_empty()) {
            return Err(CoreError::ConfigMissingField {
                field: "sources.external_player.seek_command".into(),
            });
        }
        if !self.seek_command.iter().any(|arg| arg.contains(POSITION_PLACEHOLDER)) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "sources.external_player.seek_command must contain {POSITION_PLACEHOLDER}"
                ),
            });
        }
        if self.poll_interval_ms == 0 || self.command_timeout_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "sources.external_player intervals must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

/// Config template for the external player source.
/// This is appended to the base config template when creating a new config file.
pub const CONFIG_TEMPLATE: &str = concatcp!(
    r#"[sources.external_player]
# Follow a separate media application instead of the built-in transport.
# query_command must print {"title": "...", "artist": "...", "time": <length>, "position": <seconds>}
# as JSON, or null when nothing is playing.
query_command = []
# {position} is replaced with the target position in seconds
seek_command = []
poll_interval_ms = "#,
    DEFAULT_POLL_INTERVAL_MS,
    "\ncommand_timeout_ms = ",
    DEFAULT_COMMAND_TIMEOUT_MS,
    "\n\n"
);

#[cfg(test)]
mod tests {
    use super::*;
    use lyricsync_core::LyricsyncConfig;

    fn parse(toml: &str) -> Option<ExternalPlayerConfig> {
        let config = LyricsyncConfig::from_toml_str(toml).unwrap();
        ExternalPlayerConfig::from_sources(&config.sources).unwrap()
    }

    #[test]
    fn test_from_sources_with_defaults() {
        let config = parse(
            r#"
[sources.external_player]
query_command = ["player-ctl", "status"]
seek_command = ["player-ctl", "seek", "{position}"]
"#,
        )
        .unwrap();

        assert_eq!(config.query_command, vec!["player-ctl", "status"]);
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.command_timeout_ms, 2000);
        config.validate().unwrap();
    }

    #[test]
    fn test_absent_table_is_none() {
        assert!(parse("").is_none());
    }

    #[test]
    fn test_template_parses_but_needs_commands() {
        let config = parse(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.poll_interval_ms, 500);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, CoreError::ConfigMissingField { field } if field.ends_with("query_command")));
    }

    #[test]
    fn test_seek_command_needs_placeholder() {
        let config = ExternalPlayerConfig {
            query_command: vec!["q".into()],
            seek_command: vec!["seek".into(), "10".into()],
            poll_interval_ms: 500,
            command_timeout_ms: 2000,
        };
        assert!(matches!(config.validate(), Err(CoreError::ConfigInvalid { .. })));
    }
}
