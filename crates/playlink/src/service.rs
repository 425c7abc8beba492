//! The game-facing facade over the connection cache.
//!
//! `GameService` adds three things on top of [`ConnectionStateCache`]:
//! logical-key → provider-ID mapping, a readiness gate that answers
//! without touching the cache's provider, and uniform [`ActionResult`]s.

use std::sync::Arc;

use playlink_connection::{
    ConnectionError, ConnectionState, ConnectionStateCache, ConnectionStatus, Subscription,
};
use playlink_provider::{AuthProvider, Player};
use tokio::sync::watch;

use crate::{ActionResult, GameServiceConfig, PlaylinkError};

/// Progress reported when the caller doesn't give one: fully unlocked.
pub const DEFAULT_ACHIEVEMENT_PERCENT: f64 = 100.0;

/// Message used when the provider answered "no" without saying why.
const REJECTED_BY_PROVIDER: &str = "rejected by provider";

/// Emits a service-level event only when `enable_logging` is set.
macro_rules! service_log {
    ($service:expr, $level:ident, $($arg:tt)+) => {
        if $service.config.enable_logging {
            tracing::$level!(target: "playlink::service", $($arg)+);
        }
    };
}

/// Facade that games call into.
///
/// Cheap to clone: every clone shares the same cache (and therefore the
/// same status, listeners, and in-flight check).
pub struct GameService<P: AuthProvider> {
    cache: Arc<ConnectionStateCache<P>>,
    config: GameServiceConfig,
}

impl<P: AuthProvider> Clone for GameService<P> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
        }
    }
}

impl<P: AuthProvider> GameService<P> {
    pub fn new(cache: Arc<ConnectionStateCache<P>>, config: GameServiceConfig) -> Self {
        Self { cache, config }
    }

    pub fn cache(&self) -> &Arc<ConnectionStateCache<P>> {
        &self.cache
    }

    pub fn config(&self) -> &GameServiceConfig {
        &self.config
    }

    /// Whether a provider of type `P` can exist on this platform.
    pub fn is_platform_supported() -> bool {
        P::is_platform_supported()
    }

    // -----------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------

    /// Runs a forced connection check and returns its result.
    ///
    /// On an unsupported platform the provider is left alone and the
    /// current (normally `Uninitialized`) status is returned.
    pub async fn initialize(&self) -> ConnectionStatus {
        service_log!(self, info, "initializing game services");

        if !Self::is_platform_supported() {
            service_log!(self, info, "platform not supported, game services unavailable");
            return self.cache.status();
        }

        self.cache.check_connection(true).await
    }

    /// Signs the player in. `false` without any provider call on an
    /// unsupported platform.
    pub async fn authenticate(&self) -> bool {
        service_log!(self, info, "attempting authentication");

        if !Self::is_platform_supported() {
            service_log!(self, info, "authentication skipped: platform not supported");
            return false;
        }

        let authenticated = self.cache.authenticate().await;
        if !authenticated {
            let status = self.cache.status();
            service_log!(
                self,
                warn,
                state = %status.state,
                error = status.last_error.as_deref().unwrap_or_default(),
                "authentication failed"
            );
        }
        authenticated
    }

    pub fn status(&self) -> ConnectionStatus {
        self.cache.status()
    }

    /// `true` when the player is signed in and actions may proceed.
    pub fn is_ready(&self) -> bool {
        self.cache.status().is_ready()
    }

    pub fn player(&self) -> Option<Player> {
        self.cache.status().player
    }

    /// The signed-in player's avatar, if any. `None` when not ready.
    pub async fn player_image(&self) -> Option<Vec<u8>> {
        if !self.is_ready() {
            service_log!(self, debug, "player image skipped: not ready");
            return None;
        }
        self.cache.player_image().await
    }

    // -----------------------------------------------------------------
    // Scores and achievements
    // -----------------------------------------------------------------

    /// Posts `score` to the leaderboard registered under `leaderboard_key`
    /// (or to `leaderboard_key` itself if it isn't mapped).
    pub async fn submit_score(&self, score: i64, leaderboard_key: &str) -> ActionResult {
        const ACTION: &str = "score submission";
        let leaderboard_id = self.config.leaderboard_id(leaderboard_key);
        service_log!(self, info, score, %leaderboard_id, "submitting score");

        if !self.is_ready() {
            let err = PlaylinkError::NotReady { action: ACTION };
            service_log!(self, warn, %leaderboard_id, "{err}");
            return ActionResult::failed(err);
        }

        let outcome = self.cache.try_submit_score(score, leaderboard_id).await;
        match settle(ACTION, outcome) {
            Ok(()) => {
                service_log!(self, info, score, %leaderboard_id, "score submitted");
                ActionResult::ok()
            }
            Err(err) => {
                service_log!(self, warn, error = %err, %leaderboard_id, "score not submitted");
                ActionResult::failed(err)
            }
        }
    }

    /// Reports achievement progress. `percent_complete` is clamped to
    /// `0.0..=100.0`; NaN is refused before anything is sent.
    pub async fn report_achievement(
        &self,
        achievement_key: &str,
        percent_complete: f64,
    ) -> ActionResult {
        const ACTION: &str = "achievement report";
        let achievement_id = self.config.achievement_id(achievement_key);
        service_log!(self, info, %achievement_id, percent_complete, "reporting achievement");

        if !self.is_ready() {
            let err = PlaylinkError::NotReady { action: ACTION };
            service_log!(self, warn, %achievement_id, "{err}");
            return ActionResult::failed(err);
        }

        let percent = match normalize_percent(percent_complete) {
            Ok(percent) => percent,
            Err(err) => {
                service_log!(self, warn, %achievement_id, "{err}");
                return ActionResult::failed(err);
            }
        };

        let outcome = self
            .cache
            .try_report_achievement(achievement_id, percent)
            .await;
        match settle(ACTION, outcome) {
            Ok(()) => {
                service_log!(self, info, %achievement_id, percent, "achievement reported");
                ActionResult::ok()
            }
            Err(err) => {
                service_log!(self, warn, error = %err, %achievement_id, "achievement not reported");
                ActionResult::failed(err)
            }
        }
    }

    // -----------------------------------------------------------------
    // Platform UI
    // -----------------------------------------------------------------

    pub async fn show_leaderboard(&self, leaderboard_key: &str) {
        let leaderboard_id = self.config.leaderboard_id(leaderboard_key);
        service_log!(self, info, %leaderboard_id, "showing leaderboard");

        if !self.is_ready() {
            service_log!(self, warn, %leaderboard_id, "cannot show leaderboard: not ready");
            return;
        }
        self.cache.present_leaderboard(leaderboard_id).await;
    }

    pub async fn show_achievements(&self) {
        service_log!(self, info, "showing achievements");

        if !self.is_ready() {
            service_log!(self, warn, "cannot show achievements: not ready");
            return;
        }
        self.cache.present_achievements().await;
    }

    /// Shows the provider's own dashboard.
    pub async fn show_game_center(&self) {
        service_log!(self, info, "showing dashboard");

        if !self.is_ready() {
            service_log!(self, warn, "cannot show dashboard: not ready");
            return;
        }
        self.cache.present_dashboard().await;
    }

    // -----------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------

    /// See [`ConnectionStateCache::add_listener`].
    pub fn add_status_listener(
        &self,
        listener: impl Fn(&ConnectionStatus) + Send + Sync + 'static,
    ) -> Subscription {
        self.cache.add_listener(listener)
    }

    pub fn watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.cache.watch()
    }

    /// Human-readable sentence for `state`, or for the live state when
    /// `None`.
    pub fn connection_state_description(&self, state: Option<ConnectionState>) -> &'static str {
        describe_state(state.unwrap_or_else(|| self.cache.status().state))
    }

    /// Drops the session so the next `initialize` starts over.
    pub fn reset(&self) {
        service_log!(self, info, "resetting game services");
        self.cache.reset();
    }
}

/// Fixed user-facing sentence for each connection state.
pub fn describe_state(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Uninitialized => "Game services not initialized",
        ConnectionState::Checking => "Checking game services availability",
        ConnectionState::Authenticated => "Connected to game services",
        ConnectionState::NotAvailable => "Game services not available or player not signed in",
        ConnectionState::Error => "Game services connection error",
    }
}

/// A provider `false` becomes a failure of its own; cache errors pass
/// through as they were produced by this call.
fn settle(
    action: &'static str,
    outcome: Result<bool, ConnectionError>,
) -> Result<(), PlaylinkError> {
    match outcome? {
        true => Ok(()),
        false => Err(ConnectionError::ActionFailed {
            action,
            message: REJECTED_BY_PROVIDER.to_owned(),
        }
        .into()),
    }
}

fn normalize_percent(percent: f64) -> Result<f64, PlaylinkError> {
    if percent.is_nan() {
        return Err(PlaylinkError::InvalidProgress(percent));
    }
    Ok(percent.clamp(0.0, 100.0))
}

impl<P: AuthProvider> std::fmt::Debug for GameService<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameService")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish()
    }
}
