//! The provider capability surface.
//!
//! Playlink doesn't implement authentication itself. The platform does
//! (Game Center, a console SDK, a web identity service), and Playlink
//! only needs a small set of async calls into it. [`AuthProvider`] is
//! that set.
//!
//! # Why a trait?
//!
//! The same connection cache runs against:
//! - the real platform bridge in production
//! - [`UnavailableProvider`] on platforms with no provider at all
//! - scripted mocks in tests
//!
//! without any change to the caching or gating logic.

use std::future::Future;

use crate::{Player, ProviderError};

/// Async capability surface of an identity/leaderboard provider.
///
/// # Trait bounds
///
/// - `Send + Sync` → one provider is shared by every task that touches
///   the connection cache.
/// - `'static` → the provider lives as long as the cache that owns it.
///
/// Every method returns a `Send` future so callers may drive checks from
/// any Tokio worker. Implementations are free to write `async fn` in
/// their `impl` block.
///
/// # Timeouts
///
/// The cache never times a call out on its own. A provider that can hang
/// (the platform sign-in sheet, for instance) should be wrapped in
/// [`WithTimeout`](crate::WithTimeout) or resolve with
/// [`ProviderError::Timeout`] itself.
///
/// # Example
///
/// ```rust
/// use playlink_provider::{AuthProvider, Player, ProviderError};
///
/// /// Always signed in as the same guest.
/// struct GuestProvider;
///
/// impl AuthProvider for GuestProvider {
///     async fn is_available(&self) -> Result<bool, ProviderError> {
///         Ok(true)
///     }
///     async fn authenticate(&self) -> Result<bool, ProviderError> {
///         Ok(true)
///     }
///     async fn get_player(&self) -> Result<Option<Player>, ProviderError> {
///         Ok(Some(Player::new("guest", "Guest", "guest")))
///     }
///     async fn get_player_image(&self) -> Result<Option<Vec<u8>>, ProviderError> {
///         Ok(None)
///     }
///     async fn submit_score(&self, _score: i64, _leaderboard_id: &str) -> Result<bool, ProviderError> {
///         Ok(true)
///     }
///     async fn report_achievement(&self, _achievement_id: &str, _percent: f64) -> Result<bool, ProviderError> {
///         Ok(true)
///     }
///     async fn present_leaderboard(&self, _leaderboard_id: &str) -> Result<(), ProviderError> {
///         Ok(())
///     }
///     async fn present_achievements(&self) -> Result<(), ProviderError> {
///         Ok(())
///     }
///     async fn present_dashboard(&self) -> Result<(), ProviderError> {
///         Ok(())
///     }
/// }
/// ```
pub trait AuthProvider: Send + Sync + 'static {
    /// Whether the provider is reachable and enabled on this device.
    fn is_available(&self) -> impl Future<Output = Result<bool, ProviderError>> + Send;

    /// Signs the local player in, showing platform UI if the platform
    /// needs to. Resolves `Ok(false)` when the player declines.
    fn authenticate(&self) -> impl Future<Output = Result<bool, ProviderError>> + Send;

    /// Profile of the signed-in player, or `None` if nobody is signed in.
    fn get_player(&self) -> impl Future<Output = Result<Option<Player>, ProviderError>> + Send;

    /// Encoded avatar image of the signed-in player.
    fn get_player_image(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, ProviderError>> + Send;

    /// Posts `score` to the leaderboard with the given provider ID.
    fn submit_score(
        &self,
        score: i64,
        leaderboard_id: &str,
    ) -> impl Future<Output = Result<bool, ProviderError>> + Send;

    /// Reports progress (`0.0..=100.0`) on an achievement.
    fn report_achievement(
        &self,
        achievement_id: &str,
        percent: f64,
    ) -> impl Future<Output = Result<bool, ProviderError>> + Send;

    /// Shows the platform's leaderboard UI.
    fn present_leaderboard(
        &self,
        leaderboard_id: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Shows the platform's achievements UI.
    fn present_achievements(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Shows the platform's main dashboard.
    fn present_dashboard(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Whether this kind of provider can exist on the current platform
    /// at all. Checked before any call is made.
    fn is_platform_supported() -> bool {
        true
    }
}

/// Stand-in for a platform that has no provider.
///
/// Availability checks resolve `false`, so the connection cache settles
/// in `NotAvailable` instead of failing at startup. Any other call is a
/// caller bug (the cache gates them) and resolves with
/// [`ProviderError::NotInitialized`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableProvider;

impl AuthProvider for UnavailableProvider {
    async fn is_available(&self) -> Result<bool, ProviderError> {
        Ok(false)
    }

    async fn authenticate(&self) -> Result<bool, ProviderError> {
        Err(ProviderError::NotInitialized)
    }

    async fn get_player(&self) -> Result<Option<Player>, ProviderError> {
        Err(ProviderError::NotInitialized)
    }

    async fn get_player_image(&self) -> Result<Option<Vec<u8>>, ProviderError> {
        Err(ProviderError::NotInitialized)
    }

    async fn submit_score(&self, _score: i64, _leaderboard_id: &str) -> Result<bool, ProviderError> {
        Err(ProviderError::NotInitialized)
    }

    async fn report_achievement(
        &self,
        _achievement_id: &str,
        _percent: f64,
    ) -> Result<bool, ProviderError> {
        Err(ProviderError::NotInitialized)
    }

    async fn present_leaderboard(&self, _leaderboard_id: &str) -> Result<(), ProviderError> {
        Err(ProviderError::NotInitialized)
    }

    async fn present_achievements(&self) -> Result<(), ProviderError> {
        Err(ProviderError::NotInitialized)
    }

    async fn present_dashboard(&self) -> Result<(), ProviderError> {
        Err(ProviderError::NotInitialized)
    }

    fn is_platform_supported() -> bool {
        false
    }
}
