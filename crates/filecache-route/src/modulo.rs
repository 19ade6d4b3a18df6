//! Modulo routing over a dense `0..shard_count` topology.

use filecache_types::{ShardId, StorageId};

use crate::{RouteError, ShardRouter};

/// Routes `storage` to shard `storage % shard_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuloRouter {
    shard_count: u32,
}

impl ModuloRouter {
    pub fn new(shard_count: u32) -> Result<Self, RouteError> {
        if shard_count == 0 {
            return Err(RouteError::NoShards);
        }
        Ok(Self { shard_count })
    }

    pub fn shard_count(&self) -> u32 {
        self.shard_count
    }
}

impl ShardRouter for ModuloRouter {
    fn route(&self, storage: StorageId) -> ShardId {
        // The remainder is < shard_count, which fits in u32.
        ShardId::new((storage.get() % u64::from(self.shard_count)) as u32)
    }

    fn all_shards(&self) -> Vec<ShardId> {
        (0..self.shard_count).map(ShardId::new).collect()
    }
}
