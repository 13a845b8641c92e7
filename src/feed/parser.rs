//! RSS 2.0 / Atom feed parser
//!
//! Handles the conventions used by the common anime release sites:
//! - Standard RSS 2.0 with a torrent `enclosure`
//! - nyaa.si `nyaa:infoHash`
//! - ezRSS `torrent:magnetURI`
//! - magnet links placed directly in the enclosure URL (share.acgnx.se)
//! - hashes embedded in the link (bangumi.moe)
//! - Atom feeds with `media:content` or `rel="enclosure"` links

use tracing::{debug, info};

use crate::error::Result;
use crate::feed::item::FeedItem;
use crate::feed::xml::{parse_document, Ns, XmlElement};
use crate::torrent::{extract_hash_from_magnet, extract_hash_from_url, is_magnet_link, is_valid_info_hash};

pub const MEDIA_NS: &str = "http://search.yahoo.com/mrss/";
pub const EZRSS_NS: &str = "http://xmlns.ezrss.it/0.1/";
pub const NYAA_NS: &str = "https://nyaa.si/xmlns/nyaa";

const BITTORRENT_MIME: &str = "application/x-bittorrent";

/// Feed dialect, decided by the root element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Atom,
}

impl FeedFormat {
    pub fn detect(root: &XmlElement) -> Self {
        if root.name == "feed" {
            FeedFormat::Atom
        } else {
            FeedFormat::Rss
        }
    }
}

/// Parse a feed document into items, in document order
///
/// `xml` is the raw body; its declared encoding is honoured.
pub fn parse_feed_document(xml: impl AsRef<[u8]>) -> Result<Vec<FeedItem>> {
    let root = parse_document(xml)?;
    let format = FeedFormat::detect(&root);
    debug!("Detected {:?} feed (root <{}>)", format, root.name);

    let items: Vec<FeedItem> = match format {
        FeedFormat::Atom => root
            .descendants_named(Ns::Atom, "entry")
            .into_iter()
            .map(parse_atom_entry)
            .collect(),
        FeedFormat::Rss => root
            .descendants_named(Ns::None, "item")
            .into_iter()
            .map(parse_rss_item)
            .collect(),
    };

    let with_hash = items.iter().filter(|item| item.has_hash()).count();
    info!("Parsed {} feed items ({} with embedded hash)", items.len(), with_hash);
    Ok(items)
}

fn text_or_empty(element: &XmlElement, ns: Ns<'_>, name: &str) -> String {
    element.child_text(ns, name).unwrap_or_default().to_string()
}

fn parse_rss_item(item: &XmlElement) -> FeedItem {
    let title = text_or_empty(item, Ns::None, "title");
    let link = text_or_empty(item, Ns::None, "link");
    let description = text_or_empty(item, Ns::None, "description");
    let published = item.child_text(Ns::None, "pubDate").map(str::to_string);

    let mut torrent_url = String::new();
    let mut hash = String::new();

    if let Some(enclosure) = item.child(Ns::None, "enclosure") {
        let enc_url = enclosure.attr("url").unwrap_or_default().trim();
        let enc_type = enclosure.attr("type").unwrap_or_default();
        if !enc_url.is_empty() {
            if is_magnet_link(enc_url) {
                torrent_url = enc_url.to_string();
                hash = extract_hash_from_magnet(enc_url);
            } else if enc_type.contains("torrent") {
                torrent_url = enc_url.to_string();
            }
        }
    }

    if torrent_url.is_empty() {
        if let Some(magnet) = item.child_text(Ns::Uri(EZRSS_NS), "magnetURI") {
            torrent_url = magnet.to_string();
        }
    }

    if hash.is_empty() {
        if let Some(info_hash) = item.child_text(Ns::Uri(NYAA_NS), "infoHash") {
            let candidate = info_hash.to_ascii_lowercase();
            if is_valid_info_hash(&candidate) {
                hash = candidate;
            } else {
                debug!("Ignoring malformed nyaa:infoHash '{}' on '{}'", info_hash, title);
            }
        }
    }

    if hash.is_empty() {
        let effective = if torrent_url.is_empty() { &link } else { &torrent_url };
        hash = extract_hash_from_url(effective);
    }

    FeedItem {
        title,
        link,
        description,
        torrent_url,
        hash,
        published,
    }
}

fn parse_atom_entry(entry: &XmlElement) -> FeedItem {
    let title = text_or_empty(entry, Ns::Atom, "title");
    let description = text_or_empty(entry, Ns::Atom, "summary");
    let published = entry
        .child_text(Ns::Atom, "published")
        .or_else(|| entry.child_text(Ns::Atom, "updated"))
        .map(str::to_string);

    let links: Vec<&XmlElement> = entry.children_named(Ns::Atom, "link").collect();
    let main_link = links
        .iter()
        .find(|l| matches!(l.attr("rel"), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|l| link_target(l))
        .unwrap_or_default();

    let mut torrent_url = entry
        .children_named(Ns::Uri(MEDIA_NS), "content")
        .find(|c| c.attr("type") == Some(BITTORRENT_MIME))
        .and_then(|c| c.attr("url"))
        .unwrap_or_default()
        .to_string();

    if torrent_url.is_empty() {
        if let Some(enclosure) = links.iter().find(|l| l.attr("rel") == Some("enclosure")) {
            torrent_url = enclosure.attr("href").unwrap_or_default().to_string();
        }
    }

    if torrent_url.is_empty()
        && (main_link.ends_with(".torrent") || main_link.to_ascii_lowercase().contains("torrent"))
    {
        torrent_url = main_link.clone();
    }

    let effective = if torrent_url.is_empty() { &main_link } else { &torrent_url };
    let hash = extract_hash_from_url(effective);

    FeedItem {
        title,
        link: main_link,
        description,
        torrent_url,
        hash,
        published,
    }
}

fn link_target(link: &XmlElement) -> String {
    link.attr("href")
        .filter(|href| !href.is_empty())
        .unwrap_or(link.text.as_str())
        .to_string()
}
