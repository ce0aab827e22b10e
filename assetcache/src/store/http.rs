//! HTTP-backed remote store.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use tracing::{debug, trace};

use super::{RemoteAssetStore, StoreError};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("assetcache/", env!("CARGO_PKG_VERSION"));

/// Fetches assets with HTTP GET from `<base_url>/<remote_path>`.
#[derive(Clone)]
pub struct HttpAssetStore {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpAssetStore {
    /// Creates a store with the default 30 second timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, StoreError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a store with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let base_url = base_url.into();
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| StoreError::Transport(format!("Invalid base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Transport(format!(
                "Base URL '{}' cannot hold a path",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StoreError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Base URL every remote path is appended to.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Appends each segment of `remote_path`, percent-encoded, to the base URL.
    fn url_for(&self, remote_path: &str) -> Url {
        let mut url = self.base_url.clone();
        // Checked in the constructor
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(remote_path.split('/').filter(|s| !s.is_empty()));
        }
        url
    }
}

impl RemoteAssetStore for HttpAssetStore {
    async fn fetch(&self, remote_path: &str, max_bytes: u64) -> Result<Vec<u8>, StoreError> {
        let url = self.url_for(remote_path);
        trace!(url = %url, "HTTP GET");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(remote_path.to_string()));
        }
        if !status.is_success() {
            return Err(StoreError::Transport(format!("HTTP {} from {}", status, url)));
        }

        let too_large = || StoreError::SizeExceeded {
            path: remote_path.to_string(),
            limit: max_bytes,
        };

        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(too_large());
        }

        // Content-Length is advisory; enforce the limit while streaming.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| StoreError::Transport(format!("Failed to read response: {}", e)))?
        {
            if (body.len() + chunk.len()) as u64 > max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url = %url, bytes = body.len(), "HTTP fetch complete");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let store = HttpAssetStore::new("https://assets.example.com/").unwrap();
        assert_eq!(store.base_url(), "https://assets.example.com");
        assert_eq!(
            store.url_for("/avatar_assets/json/colors.json").as_str(),
            "https://assets.example.com/avatar_assets/json/colors.json"
        );
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let store = HttpAssetStore::new("https://assets.example.com/cdn/").unwrap();
        let url = store.url_for("avatar_assets/models/base/base/odd#name?v=1 a.usdz");

        assert_eq!(
            url.as_str(),
            "https://assets.example.com/cdn/avatar_assets/models/base/base/odd%23name%3Fv=1%20a.usdz"
        );
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            HttpAssetStore::new("not a url"),
            Err(StoreError::Transport(_))
        ));
        assert!(HttpAssetStore::new("mailto:assets@example.com").is_err());
    }

    #[test]
    fn test_with_timeout_builds() {
        let store = HttpAssetStore::with_timeout("http://localhost:9", Duration::from_millis(50));
        assert!(store.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Port 9 (discard) is closed on test machines; connection is refused.
        let store =
            HttpAssetStore::with_timeout("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = store.fetch("avatar_assets/json/colors.json", 1024).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }
}
