//! rss-hash-resolver
//!
//! Parses anime release RSS/Atom feeds and resolves a BitTorrent info-hash for
//! every item: from embedded feed metadata, from magnet links and hash-bearing
//! URLs, or by downloading and hashing the `.torrent` file.

pub mod bencode;
pub mod cli;
pub mod error;
pub mod feed;
pub mod resolver;
pub mod torrent;

#[cfg(test)]
mod test_util;

/// User-agent sent with every feed and torrent request
pub const USER_AGENT: &str = concat!("rss-hash-resolver/", env!("CARGO_PKG_VERSION"));

pub use error::{ResolverError, Result};

pub use bencode::{BencodeDict, BencodeValue};
pub use cli::{CliArgs, Config};
pub use feed::{parse_feed_document, FeedClient, FeedFormat, FeedItem};
pub use resolver::{CacheStats, HashResolver, ResolutionCache, ResolverOptions};
pub use torrent::{
    extract_hash_from_magnet, extract_hash_from_torrent_url, extract_hash_from_url,
    info_hash_from_bytes, HttpTorrentFetcher, TorrentSource,
};
