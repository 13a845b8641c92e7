//! Bencode codec
//!
//! Decodes BitTorrent metainfo serialization into a [`BencodeValue`] tree and
//! encodes it back in canonical (key-sorted) form for info-hash computation.

pub mod decode;
pub mod encode;
pub mod value;

pub use decode::{decode, decode_all, Decoder, MAX_DEPTH};
pub use encode::encode;
pub use value::{BencodeDict, BencodeValue};
