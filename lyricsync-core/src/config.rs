use crate::error::{CoreError, Result};
use crate::playlist::LoopMode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LyricsyncConfig {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Source-specific tables (`[sources.<name>]`), parsed by each source crate
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root folder scanned for audio files
    #[serde(default)]
    pub music_dir: Option<PathBuf>,
    /// File extensions (lowercase, without the dot) treated as audio
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_true")]
    pub recursive: bool,
    #[serde(default)]
    pub include_hidden: bool,
    /// Maximum directory depth when recursive (unbounded when absent)
    #[serde(default)]
    pub max_depth: Option<usize>,
}

fn default_extensions() -> Vec<String> {
    ["mp3", "m4a", "flac", "ogg", "opus", "wav"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

const fn default_true() -> bool {
    true
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            music_dir: None,
            extensions: default_extensions(),
            recursive: true,
            include_hidden: false,
            max_depth: None,
        }
    }
}

impl LibraryConfig {
    /// Whether `path` carries one of the configured extensions (case-insensitive)
    #[must_use]
    pub fn is_audio_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Catalog database file; defaults to `~/.config/lyricsync/catalog.db`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(crate::paths::catalog_db_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// "Previous" restarts the track instead when more than this many seconds played
    #[serde(default = "default_rewind_threshold")]
    pub rewind_threshold_secs: f64,
    #[serde(default)]
    pub loop_mode: LoopMode,
    /// Shuffling moves the current track to the front of the queue
    #[serde(default = "default_true")]
    pub shuffle_pins_current: bool,
}

const fn default_rewind_threshold() -> f64 {
    3.0
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            rewind_threshold_secs: default_rewind_threshold(),
            loop_mode: LoopMode::default(),
            shuffle_pins_current: true,
        }
    }
}

/// Highlight color for passed lyric lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontColor {
    #[default]
    Red,
    Blue,
    Green,
    White,
}

impl FontColor {
    pub const ALL: [Self; 4] = [Self::Red, Self::Blue, Self::Green, Self::White];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::White => "white",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub font_color: FontColor,
    /// Start with auto-scroll enabled
    #[serde(default = "default_true")]
    pub auto_scroll: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            font_color: FontColor::default(),
            auto_scroll: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to `~/.config/lyricsync/lyricsync.log`
    #[serde(default)]
    pub enabled: bool,
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            filter: default_log_filter(),
        }
    }
}

/// Dynamic `[sources.*]` tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourcesConfig(HashMap<String, toml::Value>);

impl SourcesConfig {
    /// Deserialize the `[sources.<name>]` table, if present
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not match `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.0
            .get(name)
            .map(|value| {
                value.clone().try_into().map_err(|e| CoreError::ConfigInvalid {
                    message: format!("sources.{name}: {e}"),
                })
            })
            .transpose()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

impl LyricsyncConfig {
    /// Get the config file path (~/.config/lyricsync/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default location, or write a template on first run
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or an
    /// error if the file cannot be read, parsed or validated.
    pub fn load_or_create(provider_templates: Option<&[&str]>) -> Result<Self> {
        Self::load_or_create_at(&Self::config_path(), provider_templates)
    }

    /// Same as [`Self::load_or_create`] for an explicit path
    ///
    /// # Errors
    ///
    /// See [`Self::load_or_create`].
    pub fn load_or_create_at(path: &Path, provider_templates: Option<&[&str]>) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, build_config_template(provider_templates))?;
            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// Returns an error on TOML syntax errors or invalid values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges serde cannot express
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.playback.rewind_threshold_secs;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "playback.rewind_threshold_secs must be a non-negative number, got {threshold}"
                ),
            });
        }
        if self.library.extensions.is_empty() {
            return Err(CoreError::ConfigMissingField {
                field: "library.extensions".to_string(),
            });
        }
        if self.logging.filter.trim().is_empty() {
            return Err(CoreError::ConfigMissingField {
                field: "logging.filter".to_string(),
            });
        }
        Ok(())
    }
}

const CONFIG_TEMPLATE: &str = r#"# Lyricsync Configuration
# ~/.config/lyricsync/config.toml

[library]
# Folder scanned for audio files
# music_dir = "/path/to/Music"
extensions = ["mp3", "m4a", "flac", "ogg", "opus", "wav"]
recursive = true
include_hidden = false
# max_depth = 4

[database]
# Catalog location (defaults to ~/.config/lyricsync/catalog.db)
# path = ""

[playback]
# "Previous" restarts the current track after this many seconds
rewind_threshold_secs = 3.0
# "no_loop", "loop_all", "loop_one"
loop_mode = "loop_all"
shuffle_pins_current = true

[display]
# "red", "blue", "green", "white"
font_color = "red"
auto_scroll = true

[logging]
# Also write logs to ~/.config/lyricsync/lyricsync.log
enabled = false
filter = "info"

"#;

/// Base template followed by each source's `[sources.<name>]` template
#[must_use]
pub fn build_config_template(provider_templates: Option<&[&str]>) -> String {
    let mut template = CONFIG_TEMPLATE.to_string();
    for provider in provider_templates.unwrap_or_default() {
        template.push_str(provider);
    }
    template
}
