//! rss-hash-resolver - Main entry point
//!
//! Fetches each feed given on the command line, resolves an info-hash for every
//! item and prints the result.

use std::collections::HashMap;

use anyhow::{Context, Result};
use rss_hash_resolver::{CacheStats, CliArgs, Config, FeedClient, FeedItem, HashResolver};
use serde::Serialize;
use tracing::{debug, error, info};

/// Results for one successfully fetched feed
#[derive(Debug, Serialize)]
struct FeedReport {
    url: String,
    items: Vec<FeedItem>,
    hashes: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    feeds: &'a [FeedReport],
    failed_feeds: &'a [String],
    cache: CacheStats,
}

/// Log panics through tracing before the default hook runs
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        match panic_info.location() {
            Some(location) => error!(
                "PANIC occurred at {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            ),
            None => error!("PANIC occurred at unknown location"),
        }
        let payload = panic_info.payload();
        if let Some(s) = payload.downcast_ref::<&str>() {
            error!("Panic message: {}", s);
        } else if let Some(s) = payload.downcast_ref::<String>() {
            error!("Panic message: {}", s);
        }
        default_hook(panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_panic_handler();

    let args = CliArgs::parse_args();
    init_logging(&args);
    info!("rss-hash-resolver starting");
    debug!("CLI arguments: {:?}", args);

    let config = Config::from_args(&args);
    config.validate().context("Invalid configuration")?;

    let feed_client = FeedClient::new(config.feed_timeout).context("Failed to create feed client")?;
    let resolver =
        HashResolver::with_http(config.resolver_options()).context("Failed to create hash resolver")?;

    let mut reports = Vec::new();
    let mut failed = Vec::new();

    for url in &config.feeds {
        match resolve_feed(&feed_client, &resolver, url, config.skip_slow_fetch).await {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!("Skipping feed {}: {:#}", url, e);
                failed.push(url.clone());
            }
        }
    }

    if config.json {
        let run = RunReport {
            feeds: &reports,
            failed_feeds: &failed,
            cache: resolver.cache_stats().await,
        };
        let rendered = serde_json::to_string_pretty(&run).context("Failed to serialize results")?;
        println!("{}", rendered);
    } else {
        print_lines(&reports);
    }

    if !failed.is_empty() {
        anyhow::bail!("{} of {} feeds failed", failed.len(), config.feeds.len());
    }

    info!("rss-hash-resolver finished");
    Ok(())
}

/// Initialize logging based on verbosity settings
fn init_logging(args: &CliArgs) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if args.is_verbose() {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }

    debug!("Logging initialized");
}

/// Fetch one feed and resolve hashes for its items
async fn resolve_feed(
    feed_client: &FeedClient,
    resolver: &HashResolver,
    url: &str,
    skip_slow_fetch: bool,
) -> Result<FeedReport> {
    let items = feed_client
        .fetch_feed(url)
        .await
        .with_context(|| format!("Failed to load feed {}", url))?;

    let hashes = resolver.batch_extract_hashes(&items, skip_slow_fetch).await;

    let items: Vec<FeedItem> = items
        .into_iter()
        .map(|mut item| {
            if let Some(hash) = item.resolve_hash(&hashes).map(str::to_string) {
                item.hash = hash;
            }
            item
        })
        .collect();

    let resolved = items.iter().filter(|item| item.has_hash()).count();
    info!("{}: {}/{} items have a hash", url, resolved, items.len());

    Ok(FeedReport {
        url: url.to_string(),
        items,
        hashes,
    })
}

/// Print `hash<TAB>title` for every item, `-` when unresolved
fn print_lines(reports: &[FeedReport]) {
    for report in reports {
        for item in &report.items {
            let hash = if item.has_hash() { item.hash.as_str() } else { "-" };
            println!("{}\t{}", hash, item.title);
        }
    }
}
