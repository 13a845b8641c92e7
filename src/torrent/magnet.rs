//! Fast-path hash extraction
//!
//! Derives a 40-character lowercase hex info-hash from a magnet URI or from the
//! text of a torrent URL. Every function here is pure: no I/O, no state, and an
//! empty string whenever nothing usable is found.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};
use url::Url;

const BASE32_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// `urn:btih:` token inside a magnet URI
static BTIH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)urn:btih:([a-z0-9]+)").expect("Invalid btih pattern"));

/// Maximal run of hex digits
static HEX_RUN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9a-fA-F]+").expect("Invalid hex run pattern"));

/// Extract an info-hash from a magnet link or torrent URL
///
/// Returns the hash as 40 lowercase hex characters, or an empty string.
///
/// # Example
/// ```ignore
/// let hash = extract_hash_from_url("magnet:?xt=urn:btih:55118AA1DBF75EEBAD500EC2DDD6A6DE06E8F4D0");
/// assert_eq!(hash, "55118aa1dbf75eebad500ec2ddd6a6de06e8f4d0");
/// ```
pub fn extract_hash_from_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }

    if is_magnet_link(url) {
        extract_hash_from_magnet(url)
    } else {
        extract_hash_from_torrent_url(url)
    }
}

/// Extract the btih hash from a magnet URI
///
/// The `urn:btih:` token may be 40 hex characters or 32 base32 characters.
pub fn extract_hash_from_magnet(magnet_uri: &str) -> String {
    let token = match BTIH_PATTERN.captures(magnet_uri).and_then(|caps| caps.get(1)) {
        Some(m) => m.as_str(),
        None => {
            trace!("No urn:btih token in magnet link: {}", magnet_uri);
            return String::new();
        }
    };

    if is_hex_hash(token) {
        return token.to_ascii_lowercase();
    }

    if token.len() == 32 && is_base32(token) {
        // 32 base32 characters are already a multiple of 8, so no '=' padding is needed
        return match base32_decode(token) {
            Some(bytes) if bytes.len() == 20 => hex::encode(bytes),
            _ => {
                debug!("Failed to decode base32 btih token: {}", token);
                String::new()
            }
        };
    }

    debug!(
        "btih token has unsupported length {} (expected 40 hex or 32 base32)",
        token.len()
    );
    String::new()
}

/// Extract a hash embedded in a torrent URL
///
/// Prefers a `<hash>.torrent` file name, then falls back to the first standalone
/// run of exactly 40 hex characters anywhere in the URL.
pub fn extract_hash_from_torrent_url(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        let file_name = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("");
        if let Some(stem) = file_name.strip_suffix(".torrent") {
            if is_hex_hash(stem) {
                return stem.to_ascii_lowercase();
            }
        }
    }

    HEX_RUN_PATTERN
        .find_iter(url)
        .find(|m| m.as_str().len() == 40)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Check if a string looks like a magnet link
pub fn is_magnet_link(input: &str) -> bool {
    input.trim_start().starts_with("magnet:")
}

/// Whether a URL points at a `.torrent` file and is worth downloading
pub fn looks_like_torrent_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() || is_magnet_link(url) {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.path().to_ascii_lowercase().ends_with(".torrent")
        }
        Err(_) => false,
    }
}

/// Whether `hash` is exactly 40 lowercase hex characters
pub fn is_valid_info_hash(hash: &str) -> bool {
    hash.len() == 40 && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn is_hex_hash(token: &str) -> bool {
    token.len() == 40 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_base32(token: &str) -> bool {
    token
        .bytes()
        .all(|b| BASE32_ALPHABET.contains(&b.to_ascii_uppercase()))
}

/// RFC 4648 base32 decode (case-insensitive, padding optional)
fn base32_decode(input: &str) -> Option<Vec<u8>> {
    let input = input.trim_end_matches('=');

    let mut output = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for c in input.bytes() {
        let value = BASE32_ALPHABET
            .iter()
            .position(|&x| x == c.to_ascii_uppercase())? as u64;
        buffer = (buffer << 5) | value;
        bits_in_buffer += 5;

        if bits_in_buffer >= 8 {
            bits_in_buffer -= 8;
            output.push((buffer >> bits_in_buffer) as u8);
            buffer &= (1 << bits_in_buffer) - 1;
        }
    }

    Some(output)
}
