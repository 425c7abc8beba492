//! Unified error type for Playlink.

use playlink_connection::ConnectionError;

/// Top-level error that wraps the sub-crate errors.
///
/// `#[from]` on each wrapping variant lets `?` convert sub-crate errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum PlaylinkError {
    /// The session isn't ready: no player is signed in.
    #[error("game services not ready for {action}")]
    NotReady { action: &'static str },

    /// Achievement progress was not a number.
    #[error("achievement progress must be a number, got {0}")]
    InvalidProgress(f64),

    /// A connection-level failure (not authenticated, action failed, ...).
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The service config could not be parsed.
    #[error("invalid service config: {0}")]
    Config(#[from] serde_json::Error),

    /// The service config file could not be read.
    #[error("cannot read service config: {0}")]
    Io(#[from] std::io::Error),
}
