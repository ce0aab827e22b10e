//! Request coalescing.
//!
//! When several callers ask for the same asset at once, only one fetch
//! runs and every caller receives its result.
//!
//! ```text
//! get_model(k) ─┐
//!               │                               fetch task
//! get_model(k) ─┼──► RequestCoordinator ──────► (spawned once)
//!               │        │                          │
//! get_model(k) ─┘        ▼                          ▼
//!                  [all callers await ◄──── broadcast result]
//! ```
//!
//! The first caller's fetch future is spawned onto the runtime, so
//! dropping any caller (the first one included) never cancels the shared
//! work. The in-flight entry is removed under the table lock before the
//! result is broadcast, and a guard removes it if the task is dropped or
//! panics; waiters then see [`AssetError::Cancelled`].
//!
//! Failures are delivered to every waiter and never cached: the next
//! request after a failure starts a fresh fetch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::asset::AssetKey;
use crate::error::AssetError;

type FetchResult<A> = Result<A, AssetError>;
type InFlightTable<A> = Arc<Mutex<HashMap<AssetKey, InFlight<A>>>>;

/// One in-flight fetch.
struct InFlight<A> {
    sender: broadcast::Sender<FetchResult<A>>,
    generation: u64,
}

/// Statistics for monitoring coalescing effectiveness.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Total requests received
    pub total_requests: u64,
    /// Requests that joined an existing fetch
    pub coalesced_requests: u64,
    /// Requests that started a fetch
    pub new_requests: u64,
}

impl CoordinatorStats {
    /// Returns the coalescing ratio (0.0 to 1.0)
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }
}

/// Deduplicates concurrent fetches of the same key.
pub struct RequestCoordinator<A> {
    in_flight: InFlightTable<A>,
    next_generation: AtomicU64,
    total_requests: AtomicU64,
    coalesced_requests: AtomicU64,
    new_requests: AtomicU64,
    cancellation: CancellationToken,
    label: &'static str,
}

impl<A> RequestCoordinator<A>
where
    A: Clone + Send + 'static,
{
    /// Creates a coordinator whose fetches are cancelled with `cancellation`.
    pub fn new(label: &'static str, cancellation: CancellationToken) -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            total_requests: AtomicU64::new(0),
            coalesced_requests: AtomicU64::new(0),
            new_requests: AtomicU64::new(0),
            cancellation,
            label,
        }
    }

    /// Returns the result of the in-flight fetch for `key`, starting one
    /// with `fetch_fn` if none is running.
    ///
    /// `fetch_fn` is only called by the caller that starts the fetch. Its
    /// future should populate any caches before resolving, so that a
    /// request arriving after completion finds the asset cached.
    pub async fn fetch<F, Fut>(&self, key: AssetKey, fetch_fn: F) -> FetchResult<A>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<A>> + Send + 'static,
    {
        if self.cancellation.is_cancelled() {
            return Err(AssetError::Cancelled);
        }

        let (mut receiver, leader) = {
            let mut table = self.in_flight.lock();
            self.total_requests.fetch_add(1, Ordering::Relaxed);

            if let Some(entry) = table.get(&key) {
                let coalesced = self.coalesced_requests.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(
                    kind = self.label,
                    key = %key,
                    coalesced,
                    "Coalescing request - waiting for in-flight fetch"
                );
                (entry.sender.subscribe(), None)
            } else {
                let (sender, receiver) = broadcast::channel(1);
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                table.insert(
                    key.clone(),
                    InFlight {
                        sender: sender.clone(),
                        generation,
                    },
                );
                self.new_requests.fetch_add(1, Ordering::Relaxed);
                debug!(
                    kind = self.label,
                    key = %key,
                    in_flight_count = table.len(),
                    "New request - starting fetch"
                );
                let guard = InFlightGuard {
                    table: Arc::clone(&self.in_flight),
                    key,
                    generation,
                    sender: Some(sender),
                };
                (receiver, Some(guard))
            }
        };

        // `fetch_fn` must not be held across the await below
        let fetch = leader.is_some().then(fetch_fn);
        if let (Some(mut guard), Some(fetch)) = (leader, fetch) {
            let token = self.cancellation.clone();
            tokio::spawn(async move {
                let result = tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(AssetError::Cancelled),
                    result = fetch => result,
                };
                guard.complete(result);
            });
        }

        // A closed channel means the fetch task went away without a result
        receiver.recv().await.unwrap_or(Err(AssetError::Cancelled))
    }

    /// Cancels every in-flight fetch and rejects new ones.
    pub fn shutdown(&self) {
        self.cancellation.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Returns true if a fetch for `key` is running.
    pub fn is_in_flight(&self, key: &AssetKey) -> bool {
        self.in_flight.lock().contains_key(key)
    }

    /// Returns the number of currently in-flight fetches.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            coalesced_requests: self.coalesced_requests.load(Ordering::Relaxed),
            new_requests: self.new_requests.load(Ordering::Relaxed),
        }
    }

    /// Logs current statistics.
    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            kind = self.label,
            total_requests = stats.total_requests,
            coalesced = stats.coalesced_requests,
            new_requests = stats.new_requests,
            in_flight = self.in_flight_count(),
            coalescing_ratio = format!("{:.1}%", stats.coalescing_ratio() * 100.0),
            "Request coalescing statistics"
        );
    }
}

/// Owns the in-flight entry for the lifetime of a fetch task.
struct InFlightGuard<A> {
    table: InFlightTable<A>,
    key: AssetKey,
    generation: u64,
    sender: Option<broadcast::Sender<FetchResult<A>>>,
}

impl<A> InFlightGuard<A> {
    /// Removes the entry if it is still ours.
    fn remove_entry(&self) {
        let mut table = self.table.lock();
        if table
            .get(&self.key)
            .is_some_and(|entry| entry.generation == self.generation)
        {
            table.remove(&self.key);
        }
    }

    fn complete(&mut self, result: FetchResult<A>) {
        // Every waiter subscribed under the lock, so all of them see this send
        self.remove_entry();
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(result);
        }
    }
}

impl<A> Drop for InFlightGuard<A> {
    fn drop(&mut self) {
        if self.sender.is_some() {
            self.remove_entry();
        }
    }
}
