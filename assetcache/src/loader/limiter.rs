//! Semaphore-based limiter for remote store calls.
//!
//! Permits are owned so a permit can be moved into a spawned fetch task.
//!
//! ```ignore
//! let limiter = Arc::new(ConcurrencyLimiter::new(3, "batch"));
//! let _permit = limiter.acquire().await?;
//! // remote call happens here; the permit is released on drop
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::AssetError;

/// Bounds the number of concurrent operations sharing this limiter.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max_permits: usize,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: AtomicUsize,
    label: String,
}

impl ConcurrencyLimiter {
    /// Creates a limiter allowing `max_concurrent` operations (at least one).
    pub fn new(max_concurrent: usize, label: impl Into<String>) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_permits: max_concurrent,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: AtomicUsize::new(0),
            label: label.into(),
        }
    }

    /// Waits for a permit.
    ///
    /// Fails with [`AssetError::Cancelled`] once the limiter is closed.
    pub async fn acquire(&self) -> Result<ConcurrencyPermit, AssetError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AssetError::Cancelled)?;
        Ok(self.track(permit))
    }

    /// Takes a permit if one is free.
    #[cfg(test)]
    pub(crate) fn try_acquire(&self) -> Option<ConcurrencyPermit> {
        let permit = self.semaphore.clone().try_acquire_owned().ok()?;
        Some(self.track(permit))
    }

    fn track(&self, permit: OwnedSemaphorePermit) -> ConcurrencyPermit {
        let current = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::Relaxed);
        ConcurrencyPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Wakes all waiters with an error and rejects future acquires.
    #[cfg(test)]
    pub(crate) fn close(&self) {
        self.semaphore.close();
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_permits
    }

    /// Permits currently held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Highest number of permits held at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// Held for the duration of one limited operation.
#[derive(Debug)]
pub struct ConcurrencyPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for ConcurrencyPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}
