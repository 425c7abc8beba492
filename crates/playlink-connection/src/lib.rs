//! Connection state cache for Playlink.
//!
//! This crate owns the single source of truth about the provider session:
//!
//! 1. **Status**: one [`ConnectionStatus`] snapshot per cache, created
//!    `Uninitialized` and mutated only by the cache itself
//! 2. **Single-flight checks**: at most one availability/authentication
//!    round trip in flight, with a TTL so repeated reads stay local
//! 3. **Fan-out**: every update reaches listeners ([`Subscription`]) and
//!    async watchers (`tokio::sync::watch`) as a stable snapshot
//! 4. **Gated actions**: scores, achievements, and UI calls only reach
//!    the provider while the player is signed in
//!
//! # State machine
//!
//! ```text
//!                      ┌──→ Authenticated
//! Uninitialized ──→ Checking ──→ NotAvailable
//!                      └──→ Error
//!
//! Authenticated / NotAvailable / Error ──(forced check)──→ Checking
//! any state ──(reset)──→ Uninitialized
//! ```

mod cache;
mod error;
mod listeners;
mod status;

pub use cache::ConnectionStateCache;
pub use error::ConnectionError;
pub use listeners::Subscription;
pub use status::{CacheConfig, ConnectionState, ConnectionStatus, DEFAULT_CACHE_TTL};
