//! Path constants for configuration, catalog and log files.

use std::path::PathBuf;

/// The name of the configuration directory under ~/.config/
pub const CONFIG_DIR_NAME: &str = "lyricsync";

/// The name of the main configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// The name of the catalog database file
pub const CATALOG_DB_FILE_NAME: &str = "catalog.db";

/// The name of the log file written when file logging is enabled
pub const LOG_FILE_NAME: &str = "lyricsync.log";

/// Get the configuration directory path (~/.config/lyricsync/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the config file path (~/.config/lyricsync/config.toml)
#[must_use]
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Get the catalog database path (`~/.config/lyricsync/catalog.db`)
#[must_use]
pub fn catalog_db_path() -> PathBuf {
    config_dir().join(CATALOG_DB_FILE_NAME)
}

/// Get the log file path (`~/.config/lyricsync/lyricsync.log`)
#[must_use]
pub fn log_file_path() -> PathBuf {
    config_dir().join(LOG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_config_dir() {
        let dir = config_dir();
        assert!(dir.ends_with(".config/lyricsync"));
        assert_eq!(config_path(), dir.join("config.toml"));
        assert_eq!(catalog_db_path(), dir.join("catalog.db"));
        assert_eq!(log_file_path(), dir.join("lyricsync.log"));
    }
}
