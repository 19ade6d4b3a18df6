//! Explicit storage assignment table.

use std::collections::{HashMap, HashSet};

use filecache_types::{ShardId, StorageId};

use crate::{RouteError, ShardRouter};

/// Router backed by an explicit `storage → shard` table.
///
/// Unassigned storages go to `default_shard`. The scan order returned by
/// [`ShardRouter::all_shards`] is exactly the order given at construction,
/// which makes fallback scans reproducible.
#[derive(Debug, Clone)]
pub struct StaticRouter {
    order: Vec<ShardId>,
    default_shard: ShardId,
    table: HashMap<StorageId, ShardId>,
}

impl StaticRouter {
    /// Build a router over `order`. `default_shard` must appear in it.
    pub fn new(order: Vec<ShardId>, default_shard: ShardId) -> Result<Self, RouteError> {
        if order.is_empty() {
            return Err(RouteError::NoShards);
        }
        let mut seen = HashSet::with_capacity(order.len());
        for shard in &order {
            if !seen.insert(*shard) {
                return Err(RouteError::DuplicateShard(*shard));
            }
        }
        if !seen.contains(&default_shard) {
            return Err(RouteError::UnknownShard(default_shard));
        }
        Ok(Self {
            order,
            default_shard,
            table: HashMap::new(),
        })
    }

    /// Pin `storage` to `shard`.
    pub fn assign(mut self, storage: StorageId, shard: ShardId) -> Result<Self, RouteError> {
        if !self.order.contains(&shard) {
            return Err(RouteError::UnknownShard(shard));
        }
        self.table.insert(storage, shard);
        Ok(self)
    }
}

impl ShardRouter for StaticRouter {
    fn route(&self, storage: StorageId) -> ShardId {
        self.table
            .get(&storage)
            .copied()
            .unwrap_or(self.default_shard)
    }

    fn all_shards(&self) -> Vec<ShardId> {
        self.order.clone()
    }
}
