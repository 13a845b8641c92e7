//! Feed HTTP client
//!
//! Feed-level failures are returned to the caller, unlike per-item hash failures.

use std::time::Duration;

use tracing::{debug, error, info};

use crate::error::{ResolverError, Result};
use crate::feed::item::FeedItem;
use crate::feed::parser::parse_feed_document;
use crate::USER_AGENT;

/// Fetches and parses RSS/Atom feeds
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
}

impl FeedClient {
    /// Default request timeout for feed downloads
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                ResolverError::config_error_with_field(
                    format!("Failed to build HTTP client: {}", e),
                    "feed_timeout",
                )
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch `url` once and parse it into items
    ///
    /// # Errors
    /// `FeedFetchError` for transport failures or a non-200 status,
    /// `FeedParseError` for a body that is not a well-formed feed in its declared
    /// encoding.
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<FeedItem>> {
        info!("Fetching feed: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            error!("Feed request failed for {}: {}", url, e);
            ResolverError::feed_fetch_error_full("Request failed", url, e.to_string())
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            error!("Feed request for {} returned status {}", url, status.as_u16());
            return Err(ResolverError::feed_fetch_error(
                format!("Unexpected status {}", status.as_u16()),
                url,
            ));
        }

        let body = response.bytes().await.map_err(|e| {
            error!("Failed to read feed body from {}: {}", url, e);
            ResolverError::feed_fetch_error_full("Failed to read body", url, e.to_string())
        })?;
        debug!("Downloaded {} bytes from {}", body.len(), url);

        parse_feed_document(&body).map_err(|e| {
            error!("Failed to parse feed {}: {}", url, e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{serve, unreachable_url, CannedResponse};

    const RSS: &str = r#"<?xml version="1.0"?>
        <rss version="2.0"><channel>
          <item><title>one</title><link>magnet:?xt=urn:btih:dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c</link></item>
          <item><title>two</title><link>https://example.com/2</link></item>
        </channel></rss>"#;

    fn client() -> FeedClient {
        FeedClient::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_feed() {
        let server = serve(CannedResponse::ok("application/rss+xml", RSS)).await;
        let items = client().fetch_feed(&server.url("/rss")).await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].hash, "dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c");
        assert_eq!(items[1].title, "two");
    }

    #[tokio::test]
    async fn test_non_200_is_fetch_error() {
        let server = serve(CannedResponse::status(503)).await;
        let err = client().fetch_feed(&server.url("/rss")).await.unwrap_err();
        assert!(matches!(err, ResolverError::FeedFetchError { .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_fetch_error() {
        let url = unreachable_url("/rss").await;
        let err = client().fetch_feed(&url).await.unwrap_err();
        assert!(matches!(err, ResolverError::FeedFetchError { .. }));
    }

    #[tokio::test]
    async fn test_bad_xml_is_parse_error() {
        let server = serve(CannedResponse::ok("text/html", "<html><body>oops</html>")).await;
        let err = client().fetch_feed(&server.url("/rss")).await.unwrap_err();
        assert!(matches!(err, ResolverError::FeedParseError { .. }));
    }

    #[tokio::test]
    async fn test_non_utf8_feed() {
        let mut body = b"<?xml version=\"1.0\" encoding=\"GBK\"?><rss version=\"2.0\"><channel><item><title>[".to_vec();
        body.extend_from_slice(b"\xb2\xe2\xca\xd4");
        body.extend_from_slice(b"] 01</title><link>magnet:?xt=urn:btih:dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c</link></item></channel></rss>");
        let server = serve(CannedResponse::ok("application/rss+xml", body)).await;

        let items = client().fetch_feed(&server.url("/rss")).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "[\u{6d4b}\u{8bd5}] 01");
        assert_eq!(items[0].hash, "dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c");
    }
}
