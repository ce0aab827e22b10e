//! Error types shared across the asset loading path.
//!
//! [`AssetError`] is the error every caller of the facade sees. It is
//! `Clone` because a single fetch failure is fanned out to every caller
//! that was waiting on the same in-flight request.

use std::time::Duration;
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by asset fetches.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssetError {
    /// The remote store has no asset at this path. Not retried automatically.
    #[error("Asset not found: {path}")]
    NotFound { path: String },

    /// The remote asset is larger than the allowed maximum.
    #[error("Asset at {path} exceeds the {limit} byte limit")]
    SizeExceeded { path: String, limit: u64 },

    /// Network failure talking to the remote store. Callers may retry.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Bytes were fetched but could not be decoded.
    #[error("Failed to decode '{key}': {reason}")]
    Decode { key: String, reason: String },

    /// A bounded wait expired.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The cache was shut down while the fetch was in flight.
    #[error("Fetch cancelled: asset cache shut down")]
    Cancelled,

    /// The asset key is not usable (e.g. empty).
    #[error("Invalid asset key: '{0}'")]
    InvalidKey(String),

    /// The resource index has no such category.
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// The resource index could not be loaded or parsed.
    #[error("Resource index error: {0}")]
    Index(String),
}

impl AssetError {
    /// Returns true for failures where an immediate retry may succeed.
    ///
    /// Missing or undecodable assets will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }

    /// Returns true if this error came from teardown rather than the fetch itself.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub(crate) fn decode(key: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for AssetError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(path) => Self::NotFound { path },
            StoreError::SizeExceeded { path, limit } => Self::SizeExceeded { path, limit },
            StoreError::Transport(msg) => Self::Transport(msg),
        }
    }
}
