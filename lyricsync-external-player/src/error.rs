use thiserror::Error;

/// Errors raised while talking to the external player.
#[derive(Debug, Error)]
pub enum ExternalPlayerError {
    /// The configured command line is empty.
    #[error("No {which} command configured")]
    CommandNotConfigured { which: &'static str },

    /// The command could not be started.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The command did not finish in time and was killed.
    #[error("{program} timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },

    /// The query command printed something other than a position or `null`.
    #[error("Unexpected player response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// Engine or catalog failure while applying an update.
    #[error(transparent)]
    Core(#[from] lyricsync_core::CoreError),
}

/// Convenience type alias for Results with `ExternalPlayerError`.
pub type Result<T> = std::result::Result<T, ExternalPlayerError>;
