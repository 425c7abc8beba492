use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use playlink::prelude::*;
use tracing::info;

// ---------------------------------------------------------------------------
// Local provider
// ---------------------------------------------------------------------------

/// In-process stand-in for a platform provider: signs in after a short
/// delay and keeps the best score per leaderboard in memory.
struct LocalProvider {
    player: Player,
    sign_in_delay: Duration,
    best_scores: Mutex<HashMap<String, i64>>,
    achievements: Mutex<HashMap<String, f64>>,
}

impl LocalProvider {
    fn new(sign_in_delay: Duration) -> Self {
        Self {
            player: Player::new("local-1", "Local Player", "local"),
            sign_in_delay,
            best_scores: Mutex::new(HashMap::new()),
            achievements: Mutex::new(HashMap::new()),
        }
    }

    fn best_score(&self, leaderboard_id: &str) -> Option<i64> {
        self.best_scores.lock().ok()?.get(leaderboard_id).copied()
    }
}

impl AuthProvider for LocalProvider {
    async fn is_available(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }

    async fn authenticate(&self) -> Result<bool, ProviderError> {
        tokio::time::sleep(self.sign_in_delay).await;
        Ok(true)
    }

    async fn get_player(&self) -> Result<Option<Player>, ProviderError> {
        Ok(Some(self.player.clone()))
    }

    async fn get_player_image(&self) -> Result<Option<Vec<u8>>, ProviderError> {
        Ok(None)
    }

    async fn submit_score(&self, score: i64, leaderboard_id: &str) -> Result<bool, ProviderError> {
        let mut scores = self
            .best_scores
            .lock()
            .map_err(|_| ProviderError::rejected("STORE", "score store unavailable"))?;
        let best = scores.entry(leaderboard_id.to_owned()).or_insert(score);
        *best = (*best).max(score);
        Ok(true)
    }

    async fn report_achievement(
        &self,
        achievement_id: &str,
        percent: f64,
    ) -> Result<bool, ProviderError> {
        let mut achievements = self
            .achievements
            .lock()
            .map_err(|_| ProviderError::rejected("STORE", "achievement store unavailable"))?;
        let progress = achievements.entry(achievement_id.to_owned()).or_insert(0.0);
        *progress = progress.max(percent);
        Ok(true)
    }

    async fn present_leaderboard(&self, leaderboard_id: &str) -> Result<(), ProviderError> {
        info!(%leaderboard_id, best = ?self.best_score(leaderboard_id), "leaderboard");
        Ok(())
    }

    async fn present_achievements(&self) -> Result<(), ProviderError> {
        let achievements = self
            .achievements
            .lock()
            .map_err(|_| ProviderError::rejected("STORE", "achievement store unavailable"))?;
        for (id, percent) in achievements.iter() {
            info!(achievement = %id, percent, "achievement");
        }
        Ok(())
    }

    async fn present_dashboard(&self) -> Result<(), ProviderError> {
        info!(player = %self.player, "dashboard");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Config from the JSON file named on the command line, or a built-in
/// default mapping.
fn load_config(path: Option<String>) -> Result<GameServiceConfig, PlaylinkError> {
    match path {
        Some(path) => GameServiceConfig::load(path),
        None => Ok(GameServiceConfig::default()
            .with_leaderboard("high_scores", "demo.leaderboard.high_scores")
            .with_achievement("first_game", "demo.achievement.first_game")
            .with_logging(true)),
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), PlaylinkError> {
    playlink::logging::init("info");

    let config = load_config(std::env::args().nth(1))?;
    let provider = WithTimeout::with_default_timeout(LocalProvider::new(Duration::from_millis(300)));
    let service = GameService::new(ConnectionStateCache::shared(provider), config);

    let _subscription = service.add_status_listener(|status: &ConnectionStatus| {
        info!(
            state = %status.state,
            revision = status.revision,
            "{}",
            playlink::describe_state(status.state)
        );
    });

    let result = service.submit_score(10, "high_scores").await;
    info!(success = result.success, error = ?result.error, "score before sign-in");

    let status = service.initialize().await;
    if let Some(player) = &status.player {
        info!(%player, "signed in");
    }

    for score in [1_200, 900, 4_350] {
        let result = service.submit_score(score, "high_scores").await;
        info!(score, success = result.success, "score posted");
    }

    let result = service
        .report_achievement("first_game", playlink::DEFAULT_ACHIEVEMENT_PERCENT)
        .await;
    info!(success = result.success, "achievement reported");

    service.show_leaderboard("high_scores").await;
    service.show_achievements().await;
    service.show_game_center().await;

    service.reset();
    info!(
        description = service.connection_state_description(None),
        "after reset"
    );

    Ok(())
}
