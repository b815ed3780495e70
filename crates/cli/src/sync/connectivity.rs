// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity observation.
//!
//! Connectivity is best-effort: the sync manager uses it to decide between
//! sending and queueing, and to trigger a flush when the network returns.
//! Correctness never depends on it, since callers can always invoke
//! push/pull/flush explicitly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::network::{NetworkClient, RequestConfig};

/// Connectivity state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

impl ConnectivityEvent {
    fn from_online(online: bool) -> Self {
        if online {
            ConnectivityEvent::Online
        } else {
            ConnectivityEvent::Offline
        }
    }
}

/// Identifier of a subscription, used to unsubscribe.
pub type SubscriptionId = u64;

/// A registered listener. Events arrive on `events` until unsubscribed.
pub struct Subscription {
    pub id: SubscriptionId,
    pub events: mpsc::UnboundedReceiver<ConnectivityEvent>,
}

/// Source of online/offline state and transition notifications.
pub trait ConnectivityObserver: Send + Sync {
    fn is_online(&self) -> bool;

    /// Registers a listener for state transitions.
    fn subscribe(&self) -> Subscription;

    /// Removes a listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

type Senders = HashMap<SubscriptionId, mpsc::UnboundedSender<ConnectivityEvent>>;

/// Registry of subscribed listeners.
#[derive(Default)]
struct Listeners {
    next_id: AtomicU64,
    senders: Mutex<Senders>,
}

impl Listeners {
    fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().insert(id, tx);
        Subscription { id, events: rx }
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().remove(&id);
    }

    fn broadcast(&self, event: ConnectivityEvent) {
        // Listeners whose receiver is gone are pruned
        self.lock().retain(|_, tx| tx.send(event).is_ok());
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Senders> {
        self.senders.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Online flag plus listeners; broadcasts only on transitions.
struct State {
    online: AtomicBool,
    listeners: Listeners,
}

impl State {
    fn new(online: bool) -> Self {
        State {
            online: AtomicBool::new(online),
            listeners: Listeners::default(),
        }
    }

    fn set(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            tracing::info!(online, "connectivity changed");
            self.listeners.broadcast(ConnectivityEvent::from_online(online));
        }
    }
}

/// Connectivity driven explicitly by the caller.
pub struct ManualConnectivity {
    state: State,
}

impl ManualConnectivity {
    pub fn new(online: bool) -> Self {
        ManualConnectivity {
            state: State::new(online),
        }
    }

    /// Sets the state, notifying listeners if it changed.
    pub fn set_online(&self, online: bool) {
        self.state.set(online);
    }

    pub fn listener_count(&self) -> usize {
        self.state.listeners.len()
    }
}

impl ConnectivityObserver for ManualConnectivity {
    fn is_online(&self) -> bool {
        self.state.online.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> Subscription {
        self.state.listeners.subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.state.listeners.unsubscribe(id);
    }
}

/// Connectivity derived from periodically probing a health URL.
///
/// The remote counts as reachable while the probe answers with a 2xx
/// status. Probing runs in a background task until [`stop`](Self::stop)
/// is called or the observer is dropped.
pub struct ProbeConnectivity {
    state: Arc<State>,
    cancel: CancellationToken,
}

impl ProbeConnectivity {
    /// Probes once, then keeps probing every `interval` in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(client: NetworkClient, url: String, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let online = probe(&client, &url, &cancel).await;
        tracing::debug!(url = %url, online, "initial connectivity probe");
        let state = Arc::new(State::new(online));

        let task_state = Arc::clone(&state);
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let online = probe(&client, &url, &task_cancel).await;
                if task_cancel.is_cancelled() {
                    break;
                }
                task_state.set(online);
            }
            tracing::debug!("connectivity probe stopped");
        });

        ProbeConnectivity { state, cancel }
    }

    /// Stops the background probe. The last observed state is kept.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ProbeConnectivity {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl ConnectivityObserver for ProbeConnectivity {
    fn is_online(&self) -> bool {
        self.state.online.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> Subscription {
        self.state.listeners.subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.state.listeners.unsubscribe(id);
    }
}

async fn probe(client: &NetworkClient, url: &str, cancel: &CancellationToken) -> bool {
    match client.request(url, RequestConfig::get().cancel_with(cancel.clone())).await {
        Ok(_) => true,
        Err(e) => {
            tracing::trace!(url, "probe failed: {e}");
            false
        }
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
