//! Error types for shard queries.

use filecache_types::ShardId;

/// Errors raised by the backing shard store.
///
/// These are fatal to the lookup that hit them: no other shard can stand in
/// for one that failed.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
    /// The shard is not part of this backend.
    #[error("unknown shard: {0}")]
    UnknownShard(ShardId),

    /// The shard could not be reached or refused the query.
    #[error("shard {shard} unavailable: {reason}")]
    Unavailable {
        /// The shard that failed.
        shard: ShardId,
        /// Backend-specific description.
        reason: String,
    },

    /// The backend's shared state was left poisoned by a panicking writer.
    /// Every shard is affected, so none is named.
    #[error("shard store poisoned")]
    Poisoned,
}
