//! Integration tests for the `GameService` facade.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use playlink::prelude::*;
use playlink::{ConnectionError, DEFAULT_ACHIEVEMENT_PERCENT, describe_state};

// =========================================================================
// Mock provider
// =========================================================================

/// Records the IDs and values the service actually sends.
#[derive(Default)]
struct Sent {
    scores: Mutex<Vec<(i64, String)>>,
    achievements: Mutex<Vec<(String, f64)>>,
    leaderboards_shown: Mutex<Vec<String>>,
    dashboards: AtomicUsize,
    achievement_uis: AtomicUsize,
    authenticate: AtomicUsize,
}

struct MockProvider {
    available: bool,
    signs_in: bool,
    action_result: Result<bool, ProviderError>,
    sent: Sent,
}

impl MockProvider {
    fn signed_in() -> Self {
        Self {
            available: true,
            signs_in: true,
            action_result: Ok(true),
            sent: Sent::default(),
        }
    }

    fn unreachable() -> Self {
        Self {
            available: false,
            ..Self::signed_in()
        }
    }

    fn with_action_result(mut self, result: Result<bool, ProviderError>) -> Self {
        self.action_result = result;
        self
    }

    fn action_calls(&self) -> usize {
        self.sent.scores.lock().unwrap().len()
            + self.sent.achievements.lock().unwrap().len()
            + self.sent.leaderboards_shown.lock().unwrap().len()
            + self.sent.dashboards.load(Ordering::SeqCst)
            + self.sent.achievement_uis.load(Ordering::SeqCst)
    }
}

impl AuthProvider for MockProvider {
    async fn is_available(&self) -> Result<bool, ProviderError> {
        Ok(self.available)
    }

    async fn authenticate(&self) -> Result<bool, ProviderError> {
        self.sent.authenticate.fetch_add(1, Ordering::SeqCst);
        Ok(self.signs_in)
    }

    async fn get_player(&self) -> Result<Option<Player>, ProviderError> {
        Ok(Some(Player::new("p1", "Ann", "AnnA")))
    }

    async fn get_player_image(&self) -> Result<Option<Vec<u8>>, ProviderError> {
        Ok(Some(vec![1, 2, 3]))
    }

    async fn submit_score(&self, score: i64, leaderboard_id: &str) -> Result<bool, ProviderError> {
        self.sent
            .scores
            .lock()
            .unwrap()
            .push((score, leaderboard_id.to_owned()));
        self.action_result.clone()
    }

    async fn report_achievement(
        &self,
        achievement_id: &str,
        percent: f64,
    ) -> Result<bool, ProviderError> {
        self.sent
            .achievements
            .lock()
            .unwrap()
            .push((achievement_id.to_owned(), percent));
        self.action_result.clone()
    }

    async fn present_leaderboard(&self, leaderboard_id: &str) -> Result<(), ProviderError> {
        self.sent
            .leaderboards_shown
            .lock()
            .unwrap()
            .push(leaderboard_id.to_owned());
        Ok(())
    }

    async fn present_achievements(&self) -> Result<(), ProviderError> {
        self.sent.achievement_uis.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn present_dashboard(&self) -> Result<(), ProviderError> {
        self.sent.dashboards.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn config() -> GameServiceConfig {
    GameServiceConfig::default()
        .with_leaderboard("high_scores", "com.example.lb.high")
        .with_achievement("first_win", "com.example.ach.first")
}

fn service(provider: MockProvider) -> GameService<MockProvider> {
    GameService::new(ConnectionStateCache::shared(provider), config())
}

async fn ready_service(provider: MockProvider) -> GameService<MockProvider> {
    let service = service(provider);
    let status = service.initialize().await;
    assert_eq!(status.state, ConnectionState::Authenticated);
    service
}

fn sent(service: &GameService<MockProvider>) -> &Sent {
    &service.cache().provider().sent
}

// =========================================================================
// Session
// =========================================================================

#[tokio::test]
async fn test_initialize_signed_in_player_is_ready() {
    let service = service(MockProvider::signed_in());
    assert!(!service.is_ready());

    service.initialize().await;

    assert!(service.is_ready());
    assert_eq!(service.player().map(|p| p.alias), Some("AnnA".to_owned()));
}

#[tokio::test]
async fn test_initialize_unsupported_platform_skips_provider() {
    let service = GameService::new(
        ConnectionStateCache::shared(UnavailableProvider),
        GameServiceConfig::default(),
    );

    let status = service.initialize().await;

    assert_eq!(status.state, ConnectionState::Uninitialized);
    assert!(!GameService::<UnavailableProvider>::is_platform_supported());
    assert!(!service.authenticate().await);
    assert_eq!(service.status().state, ConnectionState::Uninitialized);
}

#[tokio::test]
async fn test_authenticate_forces_new_check() {
    let service = ready_service(MockProvider::signed_in()).await;

    assert!(service.authenticate().await);

    assert_eq!(sent(&service).authenticate.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_reset_clears_session() {
    let service = ready_service(MockProvider::signed_in()).await;

    service.reset();

    assert!(!service.is_ready());
    assert!(service.player().is_none());
    assert_eq!(service.status().state, ConnectionState::Uninitialized);
}

#[tokio::test]
async fn test_player_image_not_ready_returns_none() {
    let service = service(MockProvider::signed_in());
    assert_eq!(service.player_image().await, None);

    service.initialize().await;
    assert_eq!(service.player_image().await, Some(vec![1, 2, 3]));
}

// =========================================================================
// Scores
// =========================================================================

#[tokio::test]
async fn test_submit_score_mapped_key_sends_provider_id() {
    let service = ready_service(MockProvider::signed_in()).await;

    let result = service.submit_score(1_200, "high_scores").await;

    assert_eq!(result, ActionResult::ok());
    assert_eq!(
        *sent(&service).scores.lock().unwrap(),
        vec![(1_200, "com.example.lb.high".to_owned())]
    );
}

#[tokio::test]
async fn test_submit_score_unmapped_key_sent_verbatim() {
    let service = ready_service(MockProvider::signed_in()).await;

    service.submit_score(7, "com.raw.lb").await;

    assert_eq!(
        *sent(&service).scores.lock().unwrap(),
        vec![(7, "com.raw.lb".to_owned())]
    );
}

#[tokio::test]
async fn test_submit_score_not_available_fails_without_provider_call() {
    let service = service(MockProvider::unreachable());
    let status = service.initialize().await;
    assert_eq!(status.state, ConnectionState::NotAvailable);

    let result = service.submit_score(100, "lb").await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("not ready"));
    assert_eq!(service.cache().provider().action_calls(), 0);
}

#[tokio::test]
async fn test_submit_score_provider_error_carries_message() {
    let provider = MockProvider::signed_in()
        .with_action_result(Err(ProviderError::rejected("NETWORK", "network down")));
    let service = ready_service(provider).await;

    let result = service.submit_score(5, "high_scores").await;

    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("score submission failed: network down")
    );
    assert_eq!(service.status().last_error.as_deref(), Some("network down"));
}

#[tokio::test]
async fn test_submit_score_error_survives_reset_during_failure() {
    let provider = MockProvider::signed_in()
        .with_action_result(Err(ProviderError::rejected("NETWORK", "network down")));
    let service = ready_service(provider).await;
    let weak = Arc::downgrade(service.cache());
    let _resetter = service.add_status_listener(move |status: &ConnectionStatus| {
        if status.last_error.is_some() {
            if let Some(cache) = weak.upgrade() {
                cache.reset();
            }
        }
    });

    let result = service.submit_score(5, "high_scores").await;

    assert_eq!(
        result.error.as_deref(),
        Some("score submission failed: network down")
    );
    assert_eq!(service.status().state, ConnectionState::Uninitialized);
    assert!(service.status().last_error.is_none());
}

#[tokio::test]
async fn test_submit_score_provider_declines_reports_rejection() {
    let service = ready_service(MockProvider::signed_in().with_action_result(Ok(false))).await;

    let result = service.submit_score(5, "high_scores").await;

    assert_eq!(
        result,
        ActionResult::failed(ConnectionError::ActionFailed {
            action: "score submission",
            message: "rejected by provider".into(),
        })
    );
}

// =========================================================================
// Achievements
// =========================================================================

#[tokio::test]
async fn test_report_achievement_mapped_key_and_default_percent() {
    let service = ready_service(MockProvider::signed_in()).await;

    let result = service
        .report_achievement("first_win", DEFAULT_ACHIEVEMENT_PERCENT)
        .await;

    assert!(result.success);
    assert_eq!(
        *sent(&service).achievements.lock().unwrap(),
        vec![("com.example.ach.first".to_owned(), 100.0)]
    );
}

#[tokio::test]
async fn test_report_achievement_out_of_range_is_clamped() {
    let service = ready_service(MockProvider::signed_in()).await;

    service.report_achievement("first_win", 140.0).await;
    service.report_achievement("first_win", -3.0).await;

    let sent_percents: Vec<f64> = sent(&service)
        .achievements
        .lock()
        .unwrap()
        .iter()
        .map(|(_, percent)| *percent)
        .collect();
    assert_eq!(sent_percents, vec![100.0, 0.0]);
}

#[tokio::test]
async fn test_report_achievement_nan_rejected_before_provider() {
    let service = ready_service(MockProvider::signed_in()).await;

    let result = service.report_achievement("first_win", f64::NAN).await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("must be a number"));
    assert!(sent(&service).achievements.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_report_achievement_not_ready_fails() {
    let service = service(MockProvider::signed_in());

    let result = service.report_achievement("first_win", 50.0).await;

    assert_eq!(
        result.error.as_deref(),
        Some("game services not ready for achievement report")
    );
    assert_eq!(service.cache().provider().action_calls(), 0);
}

// =========================================================================
// Platform UI
// =========================================================================

#[tokio::test]
async fn test_show_calls_not_ready_are_no_ops() {
    let service = service(MockProvider::signed_in());

    service.show_leaderboard("high_scores").await;
    service.show_achievements().await;
    service.show_game_center().await;

    assert_eq!(service.cache().provider().action_calls(), 0);
}

#[tokio::test]
async fn test_show_calls_ready_reach_provider() {
    let service = ready_service(MockProvider::signed_in()).await;

    service.show_leaderboard("high_scores").await;
    service.show_achievements().await;
    service.show_game_center().await;

    let sent = sent(&service);
    assert_eq!(
        *sent.leaderboards_shown.lock().unwrap(),
        vec!["com.example.lb.high".to_owned()]
    );
    assert_eq!(sent.achievement_uis.load(Ordering::SeqCst), 1);
    assert_eq!(sent.dashboards.load(Ordering::SeqCst), 1);
}

// =========================================================================
// Observation
// =========================================================================

#[tokio::test]
async fn test_connection_state_description_uses_live_state() {
    let service = service(MockProvider::unreachable());
    assert_eq!(
        service.connection_state_description(None),
        "Game services not initialized"
    );

    service.initialize().await;

    assert_eq!(
        service.connection_state_description(None),
        describe_state(ConnectionState::NotAvailable)
    );
    assert_eq!(
        service.connection_state_description(Some(ConnectionState::Checking)),
        "Checking game services availability"
    );
}

#[tokio::test]
async fn test_add_status_listener_sees_initialize() {
    let service = service(MockProvider::signed_in());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = service.add_status_listener(move |status: &ConnectionStatus| {
        sink.lock().unwrap().push(status.state);
    });

    service.initialize().await;
    assert!(subscription.unsubscribe());
    service.reset();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![ConnectionState::Checking, ConnectionState::Authenticated]
    );
}

#[tokio::test]
async fn test_watch_tracks_latest_status() {
    let service = service(MockProvider::signed_in());
    let rx = service.watch();

    service.initialize().await;

    assert_eq!(rx.borrow().state, ConnectionState::Authenticated);
}

#[tokio::test]
async fn test_clones_share_one_session() {
    let service = service(MockProvider::signed_in());
    let other = service.clone();

    service.initialize().await;

    assert!(other.is_ready());
}
