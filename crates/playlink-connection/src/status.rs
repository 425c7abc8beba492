//! Connection status types: the snapshot callers see and the cache policy.

use std::fmt;
use std::time::Duration;

use playlink_provider::Player;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::ConnectionError;

/// How long a settled status is trusted before a non-forced check goes
/// back to the provider.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(5000);

// ---------------------------------------------------------------------------
// CacheConfig
// ---------------------------------------------------------------------------

/// Policy knobs for [`ConnectionStateCache`](crate::ConnectionStateCache).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum age of a status that a non-forced check will serve
    /// without asking the provider.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }
}

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// Where the cache is in its check cycle.
///
/// - **Uninitialized**: nothing has been checked yet (or the cache was reset).
/// - **Checking**: a provider round trip is in flight.
/// - **Authenticated**: the provider is up and the player is signed in.
/// - **NotAvailable**: either the provider is unreachable, or it is
///   reachable and the player did not sign in. The two cases differ only
///   in [`ConnectionStatus::is_available`]; use
///   [`ConnectionStatus::failure`] to tell them apart.
/// - **Error**: the provider failed during the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Uninitialized,
    Checking,
    Authenticated,
    NotAvailable,
    Error,
}

impl ConnectionState {
    /// Returns `true` once a check has run to completion.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Authenticated | Self::NotAvailable | Self::Error)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Checking => write!(f, "checking"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::NotAvailable => write!(f, "not_available"),
            Self::Error => write!(f, "error"),
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectionStatus
// ---------------------------------------------------------------------------

/// Immutable snapshot of the connection.
///
/// Callers always receive a copy; the cache's own value is never handed
/// out, so a snapshot can't change underneath whoever holds it.
///
/// Invariants kept by the cache:
/// - `player.is_some()` ⇔ `state == Authenticated && is_authenticated`
/// - `state == NotAvailable` ⇒ `player.is_none()`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub is_available: bool,
    pub is_authenticated: bool,
    pub player: Option<Player>,
    /// Most recent failure. Cleared when a check starts.
    pub last_error: Option<String>,
    /// When this snapshot was published. `None` before the first update
    /// and after a reset.
    #[serde(skip)]
    pub last_check_at: Option<Instant>,
    /// Publish counter. Strictly increases across every update of one
    /// cache, resets included, so observers can order snapshots.
    pub revision: u64,
}

impl ConnectionStatus {
    /// The status a fresh (or freshly reset) cache reports.
    pub fn initial() -> Self {
        Self {
            state: ConnectionState::Uninitialized,
            is_available: false,
            is_authenticated: false,
            player: None,
            last_error: None,
            last_check_at: None,
            revision: 0,
        }
    }

    /// Returns `true` if actions may be sent to the provider.
    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Authenticated && self.is_authenticated
    }

    /// Returns `true` if this snapshot can be served without a new check.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.state.is_settled() && self.age().is_some_and(|age| age < ttl)
    }

    /// Time since this snapshot was published.
    pub fn age(&self) -> Option<Duration> {
        self.last_check_at.map(|at| at.elapsed())
    }

    /// Names what is wrong with a settled, unusable session.
    ///
    /// Splits `NotAvailable` back into its two causes: provider
    /// unreachable, or player not signed in. Returns `None` while the
    /// session is ready or no check has completed.
    pub fn failure(&self) -> Option<ConnectionError> {
        match self.state {
            ConnectionState::NotAvailable if !self.is_available => {
                Some(ConnectionError::ProviderUnavailable)
            }
            ConnectionState::NotAvailable => Some(ConnectionError::AuthenticationFailed(
                "player is not signed in".into(),
            )),
            ConnectionState::Error => Some(ConnectionError::AuthenticationFailed(
                self.last_error
                    .clone()
                    .unwrap_or_else(|| "unknown error".into()),
            )),
            ConnectionState::Uninitialized
            | ConnectionState::Checking
            | ConnectionState::Authenticated => None,
        }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::initial()
    }
}
