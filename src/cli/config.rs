//! CLI configuration module
//!
//! Turns parsed arguments into validated settings for the feed client and the
//! hash resolver.

use std::time::Duration;

use url::Url;

use crate::cli::args::CliArgs;
use crate::error::{ResolverError, Result};
use crate::resolver::ResolverOptions;

/// Configuration for one resolver run
#[derive(Debug, Clone)]
pub struct Config {
    /// Feeds to fetch, in order
    pub feeds: Vec<String>,
    /// Skip .torrent downloads
    pub skip_slow_fetch: bool,
    /// Maximum concurrent .torrent downloads
    pub workers: usize,
    pub fetch_timeout: Duration,
    pub feed_timeout: Duration,
    pub batch_timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_max_entries: Option<usize>,
    /// Print JSON instead of text lines
    pub json: bool,
}

impl Config {
    /// Create configuration from CLI arguments
    pub fn from_args(args: &CliArgs) -> Self {
        Self {
            feeds: args.feeds.iter().map(|feed| feed.trim().to_string()).collect(),
            skip_slow_fetch: args.skip_slow_fetch,
            workers: args.workers,
            fetch_timeout: Duration::from_secs(args.fetch_timeout),
            feed_timeout: Duration::from_secs(args.feed_timeout),
            batch_timeout: Duration::from_secs(args.batch_timeout),
            cache_ttl: Duration::from_secs(args.cache_ttl),
            cache_max_entries: args.cache_max_entries,
            json: args.json,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.feeds.is_empty() {
            return Err(ResolverError::config_error_with_field(
                "At least one feed URL is required",
                "feeds",
            ));
        }

        for feed in &self.feeds {
            let scheme_ok = Url::parse(feed)
                .map(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !scheme_ok {
                return Err(ResolverError::config_error_with_field(
                    format!("Feed URL must be http or https: {}", feed),
                    "feeds",
                ));
            }
        }

        if self.workers == 0 {
            return Err(ResolverError::config_error_with_field(
                "workers must be at least 1",
                "workers",
            ));
        }

        let timeouts = [
            ("fetch_timeout", self.fetch_timeout),
            ("feed_timeout", self.feed_timeout),
            ("batch_timeout", self.batch_timeout),
            ("cache_ttl", self.cache_ttl),
        ];
        for (field, value) in timeouts {
            if value.is_zero() {
                return Err(ResolverError::config_error_with_field(
                    format!("{} must be greater than zero", field),
                    field,
                ));
            }
        }

        if self.cache_max_entries == Some(0) {
            return Err(ResolverError::config_error_with_field(
                "cache_max_entries must be at least 1",
                "cache_max_entries",
            ));
        }

        Ok(())
    }

    /// Resolver settings derived from this configuration
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            cache_ttl: self.cache_ttl,
            max_workers: self.workers,
            fetch_timeout: self.fetch_timeout,
            batch_timeout: self.batch_timeout,
            cache_max_entries: self.cache_max_entries,
        }
    }
}
