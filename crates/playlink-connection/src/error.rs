//! Error types for the connection layer.

/// Why an action could not be carried out, or why the session is not
/// usable.
///
/// None of these cross the cache's public API as `Err`: actions report a
/// plain `bool`, and failures land in the status's `last_error`. The type
/// exists so that logs, [`ConnectionStatus::failure`], and the service
/// layer all name failures the same way.
///
/// [`ConnectionStatus::failure`]: crate::ConnectionStatus::failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// An action was attempted while the player is not signed in.
    /// Caught locally; the provider is never called.
    #[error("cannot perform {action}: player is not authenticated")]
    NotAuthenticated { action: &'static str },

    /// The provider reported itself unreachable or disabled.
    #[error("provider is not available")]
    ProviderUnavailable,

    /// Sign-in was declined, or the provider failed during the check.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The provider failed a score, achievement, or presentation call.
    #[error("{action} failed: {message}")]
    ActionFailed {
        action: &'static str,
        message: String,
    },

    /// A status listener panicked during notification.
    #[error("status listener panicked: {0}")]
    ListenerFault(String),
}
