//! # Playlink
//!
//! Client-side game services SDK. Playlink signs the local player in
//! through a platform provider, caches the session, and only lets score,
//! achievement, and UI calls through while the player is signed in.
//!
//! Game code implements nothing: the host platform supplies an
//! [`AuthProvider`], the app builds one shared [`ConnectionStateCache`],
//! and every call site works through a cheap [`GameService`] handle.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use playlink::prelude::*;
//!
//! # async fn run() -> Result<(), PlaylinkError> {
//! let cache = ConnectionStateCache::shared(UnavailableProvider);
//! let config = GameServiceConfig::default()
//!     .with_leaderboard("high_scores", "com.example.game.high_scores")
//!     .with_logging(true);
//! let service = GameService::new(cache, config);
//!
//! service.initialize().await;
//! let result = service.submit_score(9_999, "high_scores").await;
//! if !result.success {
//!     eprintln!("score not posted: {}", result.error.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod logging;
mod result;
mod service;

pub use config::GameServiceConfig;
pub use error::PlaylinkError;
pub use result::ActionResult;
pub use service::{DEFAULT_ACHIEVEMENT_PERCENT, GameService, describe_state};

pub use playlink_connection::{
    CacheConfig, ConnectionError, ConnectionState, ConnectionStateCache, ConnectionStatus,
    DEFAULT_CACHE_TTL, Subscription,
};
pub use playlink_provider::{
    AuthProvider, DEFAULT_AUTH_TIMEOUT, Player, ProviderError, UnavailableProvider, WithTimeout,
};

pub mod prelude {
    pub use crate::{
        ActionResult, AuthProvider, CacheConfig, ConnectionState, ConnectionStateCache,
        ConnectionStatus, GameService, GameServiceConfig, Player, PlaylinkError, ProviderError,
        Subscription, UnavailableProvider, WithTimeout,
    };
}
