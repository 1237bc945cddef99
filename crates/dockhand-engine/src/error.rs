//! Error types for dockhand-engine.

use dockhand_spec::ValidationErrors;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while talking to the Docker daemon or the
/// Compose CLI.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The container request failed validation before reaching the daemon.
    #[error("invalid container request: {0}")]
    Validation(#[from] ValidationErrors),

    /// Error from the Docker API.
    #[error("docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// `docker compose` exited non-zero.
    #[error("compose exited with status {status}: {stderr}")]
    Compose {
        /// Process exit status.
        status: i32,
        /// Captured stderr, trimmed.
        stderr: String,
    },

    /// I/O error spawning or reading a subprocess.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
