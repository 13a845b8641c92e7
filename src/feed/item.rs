//! Feed item value object

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::torrent::is_magnet_link;

/// One entry of a parsed feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Best candidate download URL; empty when only `link` is usable
    pub torrent_url: String,
    /// Embedded or cheaply derived info-hash; empty when unknown
    pub hash: String,
    pub published: Option<String>,
}

impl FeedItem {
    /// Whether either URL is a magnet link
    pub fn is_magnet(&self) -> bool {
        is_magnet_link(&self.link) || is_magnet_link(&self.torrent_url)
    }

    /// The URL to download from: `torrent_url` if present, else `link`
    pub fn effective_url(&self) -> &str {
        if self.torrent_url.is_empty() {
            &self.link
        } else {
            &self.torrent_url
        }
    }

    pub fn has_hash(&self) -> bool {
        !self.hash.is_empty()
    }

    /// The item's own hash, or the one a batch resolution found for its effective URL
    pub fn resolve_hash<'a>(&'a self, resolved: &'a HashMap<String, String>) -> Option<&'a str> {
        if self.has_hash() {
            return Some(&self.hash);
        }
        resolved.get(self.effective_url()).map(String::as_str)
    }
}
