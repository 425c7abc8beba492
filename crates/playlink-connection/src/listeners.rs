//! Status listeners and their subscriptions.
//!
//! # Ordering
//!
//! Fan-out is serialized by a reentrant lock that the cache takes *before*
//! its state lock and holds until every listener has returned. Snapshots
//! therefore reach listeners in revision order even when updates are
//! published from several threads. The lock is reentrant so a listener
//! may publish from inside its callback (`reset()`, a failed action); the
//! nested round delivers the newer snapshot and the interrupted round
//! stops, so no listener sees an older snapshot after a newer one.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::{ConnectionError, ConnectionStatus};

type Listener = Arc<dyn Fn(&ConnectionStatus) + Send + Sync>;

/// Registered listeners, in registration order.
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Listener)>>,
    /// Newest revision whose fan-out has started.
    fanout: ReentrantMutex<Cell<u64>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
            fanout: ReentrantMutex::new(Cell::new(0)),
        })
    }

    fn entries(&self) -> MutexGuard<'_, Vec<(u64, Listener)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn add(
        self: &Arc<Self>,
        listener: impl Fn(&ConnectionStatus) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries().push((id, Arc::new(listener)));
        tracing::debug!(listener_id = id, "status listener added");
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        before != entries.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries().len()
    }

    /// Takes the fan-out lock. Must be acquired before the cache's state
    /// lock, never while holding it.
    pub(crate) fn begin(&self) -> FanOut<'_> {
        FanOut {
            registry: self,
            newest: self.fanout.lock(),
        }
    }
}

/// Exclusive right to notify listeners, held across one publish.
pub(crate) struct FanOut<'a> {
    registry: &'a ListenerRegistry,
    newest: ReentrantMutexGuard<'a, Cell<u64>>,
}

impl FanOut<'_> {
    /// Calls every listener with `status`.
    ///
    /// Iterates over a copy of the list taken up front, so listeners that
    /// subscribe or unsubscribe from inside the callback only affect the
    /// next round. The registry lock is not held while listeners run.
    pub(crate) fn deliver(&self, status: &ConnectionStatus) {
        if status.revision < self.newest.get() {
            tracing::debug!(revision = status.revision, "stale snapshot not delivered");
            return;
        }
        self.newest.set(status.revision);

        let round: Vec<(u64, Listener)> = self.registry.entries().clone();
        for (id, listener) in round {
            if self.newest.get() != status.revision {
                tracing::debug!(
                    revision = status.revision,
                    newest = self.newest.get(),
                    "fan-out superseded by a nested update"
                );
                break;
            }
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener(status))) {
                let fault = ConnectionError::ListenerFault(panic_message(payload.as_ref()));
                tracing::error!(listener_id = id, error = %fault, "listener failed, continuing fan-out");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Handle returned by `add_listener`.
///
/// Dropping it does NOT remove the listener; call
/// [`unsubscribe`](Self::unsubscribe) for that. Listeners that should live
/// as long as the cache can simply discard their handle.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {
    /// Removes the listener. It receives no notification for any update
    /// published after this returns.
    ///
    /// Returns `false` if the listener was already gone (or the cache
    /// itself has been dropped).
    pub fn unsubscribe(self) -> bool {
        let removed = self
            .registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.id));
        if removed {
            tracing::debug!(listener_id = self.id, "status listener removed");
        }
        removed
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}
