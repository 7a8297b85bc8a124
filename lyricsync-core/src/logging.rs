//! Tracing subscriber setup.

use crate::config::LoggingConfig;
use crate::error::{CoreError, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` wins, then the configured directives.
fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
}

/// Install the global subscriber (console, plus the log file when enabled).
///
/// # Errors
///
/// Returns [`CoreError::LoggingInit`] if a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let log_file = if config.enabled {
        open_log_file(&crate::paths::log_file_path())
    } else {
        None
    };
    init_with(config, log_file)
}

fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match File::create(path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Failed to create log file at {}: {e}", path.display());
            None
        }
    }
}

fn init_with(config: &LoggingConfig, log_file: Option<File>) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer();
    let file_layer = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(Arc::new(file))
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CoreError::LoggingInit {
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = open_log_file(&dir.path().join("logs").join("test.log"));
        assert!(file.is_some());

        let config = LoggingConfig::default();
        // Whichever call runs second finds a subscriber installed
        let _ = init_with(&config, file);
        assert!(matches!(
            init_with(&config, None),
            Err(CoreError::LoggingInit { .. })
        ));
    }
}
