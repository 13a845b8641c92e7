//! Batch hash resolution
//!
//! Resolves info-hashes for many URLs at once, escalating from the in-memory
//! cache to fast-path extraction to bounded-parallel `.torrent` downloads.

pub mod batch;
pub mod cache;

pub use batch::{HashResolver, ResolverOptions};
pub use cache::{CacheStats, CachedHash, ResolutionCache};
