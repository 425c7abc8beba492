//! Error types for the provider layer.

use std::time::Duration;

/// Errors a provider call can resolve with.
///
/// The connection layer records `to_string()` of these into the status's
/// `last_error`, so `Display` is the text a player may end up seeing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// The platform rejected the call.
    ///
    /// `code` is the platform's machine-readable reason (for example
    /// `SCORE_SUBMIT_ERROR`); only `message` is shown.
    #[error("{message}")]
    Rejected { code: String, message: String },

    /// The call did not complete within the allowed time.
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// No provider is loaded on this platform.
    #[error("provider is not initialized")]
    NotInitialized,
}

impl ProviderError {
    /// Shorthand for a [`ProviderError::Rejected`].
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The platform's error code, if the platform supplied one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => Some(code),
            Self::Timeout(_) | Self::NotInitialized => None,
        }
    }
}
