//! Error types for lookups.

/// Errors that can occur during a lookup.
///
/// "Not found" is never an error: lookups return `None` or leave the id out
/// of the result map. Location-hint failures never surface here either.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// The backing shard store failed.
    #[error("shard query failed: {0}")]
    Query(#[from] filecache_shard::QueryError),
}
