//! Feed parsing
//!
//! Fetches RSS 2.0 and Atom documents and turns each entry into a [`FeedItem`],
//! picking up embedded or cheaply derivable info-hashes on the way.

pub mod client;
pub mod item;
pub mod parser;
pub mod xml;

pub use client::FeedClient;
pub use item::FeedItem;
pub use parser::{parse_feed_document, FeedFormat};
