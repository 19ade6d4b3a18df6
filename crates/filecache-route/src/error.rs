//! Error types for router construction.

use filecache_types::ShardId;

/// Errors returned when building or reshaping a router.
///
/// Routing itself is total; only topology changes can fail.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouteError {
    /// A router needs at least one shard.
    #[error("topology has no shards")]
    NoShards,

    /// A ring needs at least one virtual node per shard.
    #[error("vnodes_per_shard must be at least 1")]
    NoVnodes,

    /// A shard was listed twice in an explicit scan order.
    #[error("shard {0} listed more than once")]
    DuplicateShard(ShardId),

    /// A storage was assigned to a shard outside the topology.
    #[error("shard {0} is not part of the topology")]
    UnknownShard(ShardId),
}
