//! Lookup layer over a sharded file cache.
//!
//! [`CacheAccess`] resolves [`CacheEntry`](filecache_types::CacheEntry)
//! records by file id, by path, or in batches. Every lookup starts with a
//! *targeted* query against one shard (picked by the storage router or by a
//! location hint) and only falls back to scanning every known shard when
//! that misses. Fallback hits refresh the hint so the next lookup for the
//! same id is targeted again.

pub mod access;
pub mod error;

pub use access::CacheAccess;
pub use error::AccessError;

#[cfg(test)]
mod tests;
