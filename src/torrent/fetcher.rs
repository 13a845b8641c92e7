//! Torrent fetcher (slow path)
//!
//! Downloads a `.torrent` file and computes its info-hash. Failures never escape
//! [`TorrentSource::fetch_info_hash`]; they are logged and reported as `None`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::{ResolverError, Result};
use crate::torrent::info::info_hash_from_bytes;
use crate::USER_AGENT;

/// Source of info-hashes for `.torrent` URLs
///
/// The batch resolver only talks to this trait, so tests and alternative
/// transports can stand in for HTTP.
#[async_trait]
pub trait TorrentSource: Send + Sync {
    /// Resolve the info-hash behind a `.torrent` URL, or `None` if it cannot be resolved
    async fn fetch_info_hash(&self, url: &str) -> Option<String>;
}

/// HTTP-backed torrent fetcher
#[derive(Debug, Clone)]
pub struct HttpTorrentFetcher {
    client: reqwest::Client,
}

impl HttpTorrentFetcher {
    /// Default per-request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a fetcher with its own client and a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                ResolverError::config_error_with_field(
                    format!("Failed to build HTTP client: {}", e),
                    "fetch_timeout",
                )
            })?;
        Ok(Self { client })
    }

    /// Reuse an existing client (timeouts are whatever that client was built with)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Download `url` and compute its info-hash, reporting why it failed
    pub async fn try_fetch(&self, url: &str) -> Result<String> {
        trace!("Downloading torrent file: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            ResolverError::torrent_error_with_url(format!("Request failed: {}", e), url)
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ResolverError::torrent_error_with_url(
                format!("Unexpected status {}", status.as_u16()),
                url,
            ));
        }

        let body = response.bytes().await.map_err(|e| {
            ResolverError::torrent_error_with_url(format!("Failed to read body: {}", e), url)
        })?;
        debug!("Downloaded {} bytes from {}", body.len(), url);

        info_hash_from_bytes(&body).map_err(|e| e.with_url(url))
    }
}

#[async_trait]
impl TorrentSource for HttpTorrentFetcher {
    async fn fetch_info_hash(&self, url: &str) -> Option<String> {
        match self.try_fetch(url).await {
            Ok(hash) => {
                debug!("Resolved info hash {} from {}", hash, url);
                Some(hash)
            }
            Err(e) => {
                debug!("Failed to resolve info hash from {}: {}", url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{serve, unreachable_url, CannedResponse, SINGLE_FILE_HASH, SINGLE_FILE_TORRENT};

    fn fetcher() -> HttpTorrentFetcher {
        HttpTorrentFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_valid_torrent() {
        let server = serve(CannedResponse::ok("application/x-bittorrent", SINGLE_FILE_TORRENT)).await;
        let hash = fetcher().fetch_info_hash(&server.url("/demo.torrent")).await;
        assert_eq!(hash.as_deref(), Some(SINGLE_FILE_HASH));
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_non_200_is_unresolved() {
        let server = serve(CannedResponse::status(404)).await;
        let url = server.url("/missing.torrent");

        let err = fetcher().try_fetch(&url).await.unwrap_err();
        assert!(err.to_string().contains("404"));
        assert!(fetcher().fetch_info_hash(&url).await.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_body_is_unresolved() {
        let server = serve(CannedResponse::ok("text/html", "<html>login required</html>")).await;
        let err = fetcher().try_fetch(&server.url("/x.torrent")).await.unwrap_err();
        assert!(matches!(err, ResolverError::BencodeDecodeError { .. }));
    }

    #[tokio::test]
    async fn test_missing_info_is_unresolved() {
        let server = serve(CannedResponse::ok("application/x-bittorrent", "d8:announce3:urle")).await;
        assert!(fetcher().fetch_info_hash(&server.url("/x.torrent")).await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unresolved() {
        let url = unreachable_url("/x.torrent").await;
        assert!(fetcher().fetch_info_hash(&url).await.is_none());
    }

    #[tokio::test]
    async fn test_request_timeout_is_unresolved() {
        let server = serve(
            CannedResponse::ok("application/x-bittorrent", SINGLE_FILE_TORRENT)
                .delayed(Duration::from_secs(2)),
        )
        .await;
        let fetcher = HttpTorrentFetcher::new(Duration::from_millis(200)).unwrap();
        assert!(fetcher.fetch_info_hash(&server.url("/slow.torrent")).await.is_none());
    }
}
