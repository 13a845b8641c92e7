//! Info-hash computation
//!
//! The info-hash is the SHA-1 of the canonically re-encoded `info` dictionary.

use sha1::{Digest, Sha1};
use tracing::{debug, trace};

use crate::bencode::{self, BencodeValue};
use crate::error::{ResolverError, Result};

/// Generate info hash from canonical info dictionary bytes
pub fn generate_info_hash(info_dict_bytes: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(info_dict_bytes);
    hasher.finalize().into()
}

/// Compute the lowercase hex info-hash of a `.torrent` file's contents
pub fn info_hash_from_bytes(data: &[u8]) -> Result<String> {
    trace!("Computing info hash from {} bytes", data.len());

    let (root, consumed) = bencode::decode(data)?;
    if consumed != data.len() {
        debug!("Torrent has {} trailing bytes after root value", data.len() - consumed);
    }

    let root_dict = root.as_dict().ok_or_else(|| {
        ResolverError::torrent_error(format!("Root must be a dictionary, found {}", root.kind()))
    })?;

    let info = root_dict
        .get(b"info".as_slice())
        .ok_or_else(|| ResolverError::torrent_error("Missing info dictionary"))?;

    if let Some(name) = info.get(b"name").and_then(BencodeValue::as_bytes) {
        trace!("Hashing info dictionary for '{}'", String::from_utf8_lossy(name));
    }

    let canonical = bencode::encode(info);
    Ok(hex::encode(generate_info_hash(&canonical)))
}
