//! Core trait for querying one shard.

use filecache_types::{FileRow, Predicate, ShardId};

use crate::error::QueryError;

/// Runs filtered row scans against a single shard.
///
/// All implementations must be `Send + Sync` for use across async tasks.
/// Different shards may be backed by different physical stores; callers
/// only ever see this interface.
#[async_trait::async_trait]
pub trait ShardQuery: Send + Sync {
    /// Return every row of `shard` matching `predicate`.
    ///
    /// An empty result is not an error.
    async fn query(&self, shard: ShardId, predicate: &Predicate)
    -> Result<Vec<FileRow>, QueryError>;
}
