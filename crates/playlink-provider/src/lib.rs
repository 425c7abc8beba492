//! Provider interface for Playlink.
//!
//! Playlink never talks to an identity or leaderboard service directly.
//! The host platform (a Game Center bridge, a console SDK, a test double)
//! implements [`AuthProvider`], and the connection layer calls through it.
//!
//! # How it fits in the stack
//!
//! ```text
//! Service Layer (playlink)  ← maps keys to IDs, enforces readiness
//!     ↕
//! Connection Layer (playlink-connection)  ← caches status, single-flight checks
//!     ↕
//! Provider Layer (this crate)  ← the platform's capability surface
//! ```
//!
//! A platform without a provider is still a valid configuration: plug in
//! [`UnavailableProvider`] and every availability check reports `false`.

mod error;
mod player;
mod provider;
mod timeout;

pub use error::ProviderError;
pub use player::Player;
pub use provider::{AuthProvider, UnavailableProvider};
pub use timeout::{DEFAULT_AUTH_TIMEOUT, WithTimeout};
