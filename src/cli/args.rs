//! CLI arguments module
//!
//! Defines command-line argument parsing using clap.

use clap::Parser;

/// CLI arguments for the feed hash resolver
#[derive(Debug, Parser)]
#[command(name = "rss-hash-resolver")]
#[command(about = "Resolve BitTorrent info-hashes for RSS/Atom feed items", long_about = None)]
pub struct CliArgs {
    /// Feed URLs to fetch
    #[arg(value_name = "FEED_URL", required = true)]
    pub feeds: Vec<String>,

    /// Never download .torrent files; only use cached or embedded hashes
    #[arg(long)]
    pub skip_slow_fetch: bool,

    /// Maximum concurrent .torrent downloads
    #[arg(short, long, default_value_t = 10)]
    pub workers: usize,

    /// Timeout for a single .torrent download, in seconds
    #[arg(long, default_value_t = 10)]
    pub fetch_timeout: u64,

    /// Timeout for a feed download, in seconds
    #[arg(long, default_value_t = 30)]
    pub feed_timeout: u64,

    /// Timeout for all .torrent downloads of one feed, in seconds
    #[arg(long, default_value_t = 30)]
    pub batch_timeout: u64,

    /// How long a resolved hash is reused, in seconds
    #[arg(long, default_value_t = 3600)]
    pub cache_ttl: u64,

    /// Upper bound on cached hashes (unbounded when omitted)
    #[arg(long, value_name = "N")]
    pub cache_max_entries: Option<usize>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (no output except errors)
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Get the log level based on verbosity settings
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::ERROR
        } else {
            tracing::Level::INFO
        }
    }
}
