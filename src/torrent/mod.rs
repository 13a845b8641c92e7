//! Torrent hash handling
//!
//! The cheap path derives an info-hash from magnet links and URLs without any
//! network access; the slow path downloads the `.torrent` file and hashes its
//! `info` dictionary.

pub mod fetcher;
pub mod info;
pub mod magnet;

pub use fetcher::{HttpTorrentFetcher, TorrentSource};
pub use info::{generate_info_hash, info_hash_from_bytes};
pub use magnet::{
    extract_hash_from_magnet, extract_hash_from_torrent_url, extract_hash_from_url,
    is_magnet_link, is_valid_info_hash, looks_like_torrent_url,
};
