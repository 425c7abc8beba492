//! Deadline adapter for providers that can hang.
//!
//! Platform sign-in may wait on a sheet the player never dismisses. The
//! connection cache has no timer of its own, so the deadline is imposed
//! here, at the provider boundary, and an elapsed call surfaces as an
//! ordinary [`ProviderError::Timeout`].

use std::future::Future;
use std::time::Duration;

use crate::{AuthProvider, Player, ProviderError};

/// How long the platform bridge waits for sign-in before giving up.
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Wraps a provider and bounds every call with `tokio::time::timeout`.
#[derive(Debug, Clone)]
pub struct WithTimeout<P> {
    inner: P,
    timeout: Duration,
}

impl<P: AuthProvider> WithTimeout<P> {
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Wraps `inner` with [`DEFAULT_AUTH_TIMEOUT`].
    pub fn with_default_timeout(inner: P) -> Self {
        Self::new(inner, DEFAULT_AUTH_TIMEOUT)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "provider call timed out");
            Err(ProviderError::Timeout(limit))
        }
    }
}

impl<P: AuthProvider> AuthProvider for WithTimeout<P> {
    async fn is_available(&self) -> Result<bool, ProviderError> {
        bounded(self.timeout, self.inner.is_available()).await
    }

    async fn authenticate(&self) -> Result<bool, ProviderError> {
        bounded(self.timeout, self.inner.authenticate()).await
    }

    async fn get_player(&self) -> Result<Option<Player>, ProviderError> {
        bounded(self.timeout, self.inner.get_player()).await
    }

    async fn get_player_image(&self) -> Result<Option<Vec<u8>>, ProviderError> {
        bounded(self.timeout, self.inner.get_player_image()).await
    }

    async fn submit_score(&self, score: i64, leaderboard_id: &str) -> Result<bool, ProviderError> {
        bounded(self.timeout, self.inner.submit_score(score, leaderboard_id)).await
    }

    async fn report_achievement(
        &self,
        achievement_id: &str,
        percent: f64,
    ) -> Result<bool, ProviderError> {
        bounded(
            self.timeout,
            self.inner.report_achievement(achievement_id, percent),
        )
        .await
    }

    async fn present_leaderboard(&self, leaderboard_id: &str) -> Result<(), ProviderError> {
        bounded(self.timeout, self.inner.present_leaderboard(leaderboard_id)).await
    }

    async fn present_achievements(&self) -> Result<(), ProviderError> {
        bounded(self.timeout, self.inner.present_achievements()).await
    }

    async fn present_dashboard(&self) -> Result<(), ProviderError> {
        bounded(self.timeout, self.inner.present_dashboard()).await
    }

    fn is_platform_supported() -> bool {
        P::is_platform_supported()
    }
}
