//! The connection state cache: one status, one in-flight check at a time.
//!
//! # Concurrency note
//!
//! The status and the "check in flight" flag share one `std::sync::Mutex`.
//! Critical sections are short and never span an `.await`: provider round
//! trips run with the lock released, and the lock is taken again only to
//! publish the result. That keeps `status()` cheap for readers while a
//! slow sign-in is pending.
//!
//! Every publish first takes the listener fan-out lock, then the state
//! lock. The state lock is released before listeners run, so a listener
//! may call back into the cache; the fan-out lock stays held until the
//! round is done, so listeners hear updates in revision order even when
//! they are published from different threads. Lock order is always
//! fan-out → state. The `watch` channel is updated under the state lock
//! and always holds the latest revision.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use playlink_provider::{AuthProvider, Player, ProviderError};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::listeners::ListenerRegistry;
use crate::{CacheConfig, ConnectionError, ConnectionState, ConnectionStatus, Subscription};

/// `last_error` recorded when a check future is dropped before finishing.
const CANCELLED_CHECK: &str = "connection check cancelled";

/// Mutable state guarded by the cache's lock.
struct Inner {
    status: ConnectionStatus,
    /// Set while a provider availability/authentication round trip is
    /// outstanding. At most one at a time.
    check_in_flight: bool,
}

/// What a provider round trip concluded.
enum CheckOutcome {
    Unreachable,
    Declined,
    SignedIn(Player),
    Failed(String),
}

/// Owns the connection status and coordinates provider checks.
///
/// Construct one per process (or per test) and share it through an
/// `Arc`; every method takes `&self`.
///
/// ## Check lifecycle
///
/// ```text
/// check_connection(force)
///   ├─ fresh && !force ──────────→ cached snapshot
///   ├─ check in flight ──────────→ current snapshot (usually Checking)
///   └─ otherwise: publish Checking
///         ├─ is_available() == false ─→ NotAvailable (is_available = false)
///         ├─ authenticate() == false ─→ NotAvailable (is_available = true)
///         ├─ authenticate() == true ──→ get_player() ─→ Authenticated
///         └─ any provider error ──────→ Error (last_error = message)
/// ```
pub struct ConnectionStateCache<P: AuthProvider> {
    provider: P,
    config: CacheConfig,
    inner: Mutex<Inner>,
    listeners: Arc<ListenerRegistry>,
    watch_tx: watch::Sender<ConnectionStatus>,
}

impl<P: AuthProvider> ConnectionStateCache<P> {
    /// Creates a cache in the `Uninitialized` state with the default TTL.
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, CacheConfig::default())
    }

    pub fn with_config(provider: P, config: CacheConfig) -> Self {
        let (watch_tx, _) = watch::channel(ConnectionStatus::initial());
        Self {
            provider,
            config,
            inner: Mutex::new(Inner {
                status: ConnectionStatus::initial(),
                check_in_flight: false,
            }),
            listeners: ListenerRegistry::new(),
            watch_tx,
        }
    }

    /// Convenience for the common "build it and share it" case.
    pub fn shared(provider: P) -> Arc<Self> {
        Arc::new(Self::new(provider))
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every critical section leaves `Inner` consistent, so a panic
        // elsewhere while holding the lock doesn't invalidate it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------

    /// Returns a copy of the current status.
    pub fn status(&self) -> ConnectionStatus {
        self.lock().status.clone()
    }

    /// Returns `true` while a provider check is outstanding.
    pub fn is_checking(&self) -> bool {
        self.lock().check_in_flight
    }

    /// Subscribes to status updates as a `watch` channel.
    ///
    /// The receiver starts at the current status and sees the same
    /// snapshots listeners do (intermediate ones may be skipped if the
    /// receiver falls behind, as with any `watch`).
    pub fn watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.watch_tx.subscribe()
    }

    /// Waits until no check is in progress, then returns the status.
    ///
    /// Returns immediately if the state is anything but `Checking`,
    /// including `Uninitialized`: this never starts a check itself.
    pub async fn wait_until_settled(&self) -> ConnectionStatus {
        let mut rx = self.watch();
        match rx
            .wait_for(|status| status.state != ConnectionState::Checking)
            .await
        {
            Ok(status) => (*status).clone(),
            // The sender lives in `self`, so it can't be closed here.
            Err(_) => self.status(),
        }
    }

    // -----------------------------------------------------------------
    // Publishing
    // -----------------------------------------------------------------

    /// Applies `update` under the lock and stamps the result.
    fn stamp(
        &self,
        inner: &mut Inner,
        update: impl FnOnce(&mut ConnectionStatus),
    ) -> ConnectionStatus {
        update(&mut inner.status);
        inner.status.revision += 1;
        inner.status.last_check_at = Some(Instant::now());
        self.commit(inner)
    }

    /// Pushes the current status to the watch channel. Returns the
    /// snapshot listeners must receive once the lock is released.
    fn commit(&self, inner: &Inner) -> ConnectionStatus {
        let snapshot = inner.status.clone();
        self.watch_tx.send_replace(snapshot.clone());
        snapshot
    }

    /// Updates the status and notifies everyone.
    fn publish(&self, update: impl FnOnce(&mut ConnectionStatus)) -> ConnectionStatus {
        let fanout = self.listeners.begin();
        let snapshot = {
            let mut inner = self.lock();
            self.stamp(&mut inner, update)
        };
        fanout.deliver(&snapshot);
        snapshot
    }

    /// Records a failure without touching the state.
    fn record_error(&self, message: String) {
        self.publish(|status| status.last_error = Some(message));
    }

    // -----------------------------------------------------------------
    // Checks
    // -----------------------------------------------------------------

    /// Returns the status, asking the provider first if needed.
    ///
    /// Without `force`, a settled status younger than the TTL is served
    /// as is. Whether forced or not, a check that is already in flight is
    /// never duplicated: the caller gets the current snapshot (normally
    /// `Checking`) and can [`wait_until_settled`](Self::wait_until_settled)
    /// for the outcome.
    ///
    /// Never fails: provider errors end in the `Error` state.
    pub async fn check_connection(&self, force: bool) -> ConnectionStatus {
        let checking = {
            let fanout = self.listeners.begin();
            let mut inner = self.lock();

            if !force && inner.status.is_fresh(self.config.ttl) {
                debug!(state = %inner.status.state, "connection status served from cache");
                return inner.status.clone();
            }

            if inner.check_in_flight {
                debug!("connection check already in flight, returning current status");
                return inner.status.clone();
            }

            inner.check_in_flight = true;
            let checking = self.stamp(&mut inner, |status| {
                status.state = ConnectionState::Checking;
                status.last_error = None;
            });
            drop(inner);
            fanout.deliver(&checking);
            checking
        };
        info!(force, "checking provider connection");

        let guard = CheckGuard {
            cache: self,
            finished: false,
        };
        let outcome = self.query_provider().await;
        guard.finish(outcome)
    }

    async fn query_provider(&self) -> CheckOutcome {
        match self.provider.is_available().await {
            Ok(false) => return CheckOutcome::Unreachable,
            Ok(true) => {}
            Err(e) => return CheckOutcome::Failed(e.to_string()),
        }

        match self.provider.authenticate().await {
            Ok(false) => return CheckOutcome::Declined,
            Ok(true) => {}
            Err(e) => return CheckOutcome::Failed(e.to_string()),
        }

        match self.provider.get_player().await {
            Ok(Some(player)) => CheckOutcome::SignedIn(player),
            Ok(None) => {
                CheckOutcome::Failed("provider reported sign-in but returned no player".into())
            }
            Err(e) => CheckOutcome::Failed(e.to_string()),
        }
    }

    /// Clears the in-flight flag and publishes the check's result, in one
    /// critical section.
    fn complete_check(&self, outcome: CheckOutcome) -> ConnectionStatus {
        let fanout = self.listeners.begin();
        let snapshot = {
            let mut inner = self.lock();
            inner.check_in_flight = false;
            self.stamp(&mut inner, |status| apply_outcome(status, outcome))
        };

        match snapshot.state {
            ConnectionState::Authenticated => {
                info!(player = ?snapshot.player.as_ref().map(|p| &p.player_id), "player authenticated");
            }
            ConnectionState::NotAvailable if snapshot.is_available => {
                info!("provider available but player is not signed in");
            }
            ConnectionState::NotAvailable => info!("provider not available"),
            ConnectionState::Error => {
                error!(
                    error = snapshot.last_error.as_deref().unwrap_or_default(),
                    "connection check failed"
                );
            }
            ConnectionState::Uninitialized | ConnectionState::Checking => {}
        }

        fanout.deliver(&snapshot);
        snapshot
    }

    /// Forces a check and reports whether the player ended up signed in.
    pub async fn authenticate(&self) -> bool {
        self.check_connection(true).await.is_authenticated
    }

    // -----------------------------------------------------------------
    // Gated actions
    // -----------------------------------------------------------------

    /// Refuses `action` unless the current status is authenticated.
    fn ensure_authenticated(&self, action: &'static str) -> Result<(), ConnectionError> {
        if self.lock().status.is_authenticated {
            Ok(())
        } else {
            Err(ConnectionError::NotAuthenticated { action })
        }
    }

    /// Records a provider failure on the shared status and hands it back
    /// to the caller.
    fn settle_action<T>(
        &self,
        action: &'static str,
        result: Result<T, ProviderError>,
    ) -> Result<T, ConnectionError> {
        result.map_err(|e| {
            let failure = ConnectionError::ActionFailed {
                action,
                message: e.to_string(),
            };
            error!(error = %failure, code = e.code().unwrap_or_default(), "provider action failed");
            self.record_error(e.to_string());
            failure
        })
    }

    /// Posts a score. Returns the provider's verdict, or `false` if the
    /// player isn't signed in or the provider failed (see `last_error`).
    pub async fn submit_score(&self, score: i64, leaderboard_id: &str) -> bool {
        self.try_submit_score(score, leaderboard_id)
            .await
            .unwrap_or(false)
    }

    /// Like [`submit_score`](Self::submit_score), but says why a score
    /// was not posted. The error is the one this call produced, not
    /// whatever `last_error` holds by the time the caller reads it.
    pub async fn try_submit_score(
        &self,
        score: i64,
        leaderboard_id: &str,
    ) -> Result<bool, ConnectionError> {
        const ACTION: &str = "score submission";
        if let Err(e) = self.ensure_authenticated(ACTION) {
            warn!(error = %e, %leaderboard_id, "score not submitted");
            return Err(e);
        }

        let result = self.provider.submit_score(score, leaderboard_id).await;
        self.settle_action(ACTION, result)
    }

    /// Reports achievement progress. Same contract as
    /// [`submit_score`](Self::submit_score).
    pub async fn report_achievement(&self, achievement_id: &str, percent_complete: f64) -> bool {
        self.try_report_achievement(achievement_id, percent_complete)
            .await
            .unwrap_or(false)
    }

    pub async fn try_report_achievement(
        &self,
        achievement_id: &str,
        percent_complete: f64,
    ) -> Result<bool, ConnectionError> {
        const ACTION: &str = "achievement report";
        if let Err(e) = self.ensure_authenticated(ACTION) {
            warn!(error = %e, %achievement_id, "achievement not reported");
            return Err(e);
        }

        let result = self
            .provider
            .report_achievement(achievement_id, percent_complete)
            .await;
        self.settle_action(ACTION, result)
    }

    /// Shows the leaderboard UI. Failures are recorded and logged only.
    pub async fn present_leaderboard(&self, leaderboard_id: &str) {
        if let Err(e) = self.ensure_authenticated("leaderboard presentation") {
            warn!(error = %e, %leaderboard_id, "leaderboard not shown");
            return;
        }

        let result = self.provider.present_leaderboard(leaderboard_id).await;
        let _ = self.settle_action("leaderboard presentation", result);
    }

    pub async fn present_achievements(&self) {
        if let Err(e) = self.ensure_authenticated("achievements presentation") {
            warn!(error = %e, "achievements not shown");
            return;
        }

        let result = self.provider.present_achievements().await;
        let _ = self.settle_action("achievements presentation", result);
    }

    pub async fn present_dashboard(&self) {
        if let Err(e) = self.ensure_authenticated("dashboard presentation") {
            warn!(error = %e, "dashboard not shown");
            return;
        }

        let result = self.provider.present_dashboard().await;
        let _ = self.settle_action("dashboard presentation", result);
    }

    /// Fetches the signed-in player's avatar. `None` when not signed in,
    /// when the player has no image, or when the provider fails.
    pub async fn player_image(&self) -> Option<Vec<u8>> {
        if let Err(e) = self.ensure_authenticated("player image fetch") {
            debug!(error = %e, "player image not fetched");
            return None;
        }

        let result = self.provider.get_player_image().await;
        self.settle_action("player image fetch", result)
            .ok()
            .flatten()
    }

    // -----------------------------------------------------------------
    // Listeners and reset
    // -----------------------------------------------------------------

    /// Registers a listener called synchronously with every new snapshot.
    ///
    /// Listeners run in registration order. A panicking listener is
    /// logged and skipped; the others still run.
    pub fn add_listener(
        &self,
        listener: impl Fn(&ConnectionStatus) + Send + Sync + 'static,
    ) -> Subscription {
        self.listeners.add(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Returns to the initial `Uninitialized` status and notifies.
    ///
    /// An in-flight check is not cancelled. When it completes it still
    /// publishes its own result, replacing the reset status.
    pub fn reset(&self) {
        let fanout = self.listeners.begin();
        let snapshot = {
            let mut inner = self.lock();
            if inner.check_in_flight {
                warn!("reset while a connection check is in flight; its result will replace the reset status");
            }
            let revision = inner.status.revision + 1;
            inner.status = ConnectionStatus {
                revision,
                ..ConnectionStatus::initial()
            };
            self.commit(&inner)
        };
        info!("connection status reset");
        fanout.deliver(&snapshot);
    }
}

fn apply_outcome(status: &mut ConnectionStatus, outcome: CheckOutcome) {
    match outcome {
        CheckOutcome::Unreachable => {
            status.state = ConnectionState::NotAvailable;
            status.is_available = false;
            status.is_authenticated = false;
            status.player = None;
        }
        CheckOutcome::Declined => {
            status.state = ConnectionState::NotAvailable;
            status.is_available = true;
            status.is_authenticated = false;
            status.player = None;
        }
        CheckOutcome::SignedIn(player) => {
            status.state = ConnectionState::Authenticated;
            status.is_available = true;
            status.is_authenticated = true;
            status.player = Some(player);
        }
        CheckOutcome::Failed(message) => {
            status.state = ConnectionState::Error;
            status.is_available = false;
            status.is_authenticated = false;
            status.player = None;
            status.last_error = Some(message);
        }
    }
}

/// Clears the in-flight flag if a check future is dropped mid-flight.
///
/// Without this, cancelling `check_connection` (a `select!` timeout, an
/// aborted task) would leave the flag set and block every later check.
struct CheckGuard<'a, P: AuthProvider> {
    cache: &'a ConnectionStateCache<P>,
    finished: bool,
}

impl<P: AuthProvider> CheckGuard<'_, P> {
    fn finish(mut self, outcome: CheckOutcome) -> ConnectionStatus {
        self.finished = true;
        self.cache.complete_check(outcome)
    }
}

impl<P: AuthProvider> Drop for CheckGuard<'_, P> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("connection check dropped before completion");
            self.cache
                .complete_check(CheckOutcome::Failed(CANCELLED_CHECK.into()));
        }
    }
}

impl<P: AuthProvider> std::fmt::Debug for ConnectionStateCache<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ConnectionStateCache")
            .field("status", &inner.status)
            .field("check_in_flight", &inner.check_in_flight)
            .field("ttl", &self.config.ttl)
            .finish()
    }
}
