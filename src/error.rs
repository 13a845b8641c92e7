//! Error types for the hash resolver
//!
//! Feed-level failures (`FeedFetchError`, `FeedParseError`) are returned to the
//! caller. Bencode and torrent failures are recovered inside the resolver and only
//! ever show up in diagnostic logs.

use std::fmt;

/// Error type for feed parsing and info-hash resolution
#[derive(Debug, Clone)]
pub enum ResolverError {
    /// Feed could not be retrieved (non-200 status or transport failure)
    FeedFetchError {
        message: String,
        url: Option<String>,
        source: Option<String>,
    },

    /// Feed body is not well-formed RSS/Atom XML
    FeedParseError {
        message: String,
        source: Option<String>,
    },

    /// Malformed bencoded data
    BencodeDecodeError {
        message: String,
        position: usize,
    },

    /// Torrent body decoded but is not a usable metainfo document
    TorrentError {
        message: String,
        url: Option<String>,
    },

    /// Configuration errors
    ConfigError {
        message: String,
        field: Option<String>,
    },
}

impl ResolverError {
    /// Create a new FeedFetchError
    pub fn feed_fetch_error(message: impl Into<String>, url: impl Into<String>) -> Self {
        ResolverError::FeedFetchError {
            message: message.into(),
            url: Some(url.into()),
            source: None,
        }
    }

    /// Create a new FeedFetchError with url and source
    pub fn feed_fetch_error_full(
        message: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        ResolverError::FeedFetchError {
            message: message.into(),
            url: Some(url.into()),
            source: Some(source.into()),
        }
    }

    /// Create a new FeedParseError
    pub fn feed_parse_error(message: impl Into<String>) -> Self {
        ResolverError::FeedParseError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new FeedParseError with source
    pub fn feed_parse_error_with_source(message: impl Into<String>, source: impl Into<String>) -> Self {
        ResolverError::FeedParseError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new BencodeDecodeError at a byte offset
    pub fn bencode_error(message: impl Into<String>, position: usize) -> Self {
        ResolverError::BencodeDecodeError {
            message: message.into(),
            position,
        }
    }

    /// Create a new TorrentError
    pub fn torrent_error(message: impl Into<String>) -> Self {
        ResolverError::TorrentError {
            message: message.into(),
            url: None,
        }
    }

    /// Create a new TorrentError with url
    pub fn torrent_error_with_url(message: impl Into<String>, url: impl Into<String>) -> Self {
        ResolverError::TorrentError {
            message: message.into(),
            url: Some(url.into()),
        }
    }

    /// Create a new ConfigError
    pub fn config_error(message: impl Into<String>) -> Self {
        ResolverError::ConfigError {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new ConfigError with field
    pub fn config_error_with_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        ResolverError::ConfigError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Attach the URL being processed, if the variant carries one and it is unset
    pub fn with_url(mut self, target: impl Into<String>) -> Self {
        match &mut self {
            ResolverError::FeedFetchError { url, .. } | ResolverError::TorrentError { url, .. } => {
                if url.is_none() {
                    *url = Some(target.into());
                }
            }
            _ => {}
        }
        self
    }

    /// Whether this error is a feed-level failure the caller must handle
    pub fn is_feed_error(&self) -> bool {
        matches!(
            self,
            ResolverError::FeedFetchError { .. } | ResolverError::FeedParseError { .. }
        )
    }
}

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverError::FeedFetchError { message, url, source } => match (url, source) {
                (Some(u), Some(s)) => write!(f, "Feed fetch error: {} (url: {}, source: {})", message, u, s),
                (Some(u), None) => write!(f, "Feed fetch error: {} (url: {})", message, u),
                (None, Some(s)) => write!(f, "Feed fetch error: {} (source: {})", message, s),
                (None, None) => write!(f, "Feed fetch error: {}", message),
            },
            ResolverError::FeedParseError { message, source } => {
                if let Some(src) = source {
                    write!(f, "Feed parse error: {} (source: {})", message, src)
                } else {
                    write!(f, "Feed parse error: {}", message)
                }
            }
            ResolverError::BencodeDecodeError { message, position } => {
                write!(f, "Bencode decode error: {} (at byte {})", message, position)
            }
            ResolverError::TorrentError { message, url } => {
                if let Some(u) = url {
                    write!(f, "Torrent error: {} (url: {})", message, u)
                } else {
                    write!(f, "Torrent error: {}", message)
                }
            }
            ResolverError::ConfigError { message, field } => {
                if let Some(field_val) = field {
                    write!(f, "Config error: {} (field: {})", message, field_val)
                } else {
                    write!(f, "Config error: {}", message)
                }
            }
        }
    }
}

impl std::error::Error for ResolverError {}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, ResolverError>;

impl From<reqwest::Error> for ResolverError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string());
        let message = if err.is_timeout() {
            "Request timed out"
        } else if err.is_connect() {
            "Connection failed"
        } else {
            "Request failed"
        };
        ResolverError::FeedFetchError {
            message: message.to_string(),
            url,
            source: Some(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for ResolverError {
    fn from(err: quick_xml::Error) -> Self {
        ResolverError::feed_parse_error_with_source("Malformed XML", err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for ResolverError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ResolverError::FeedFetchError {
            message: "Operation timed out".to_string(),
            url: None,
            source: None,
        }
    }
}
