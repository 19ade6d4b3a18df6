//! Consistent hashing ring mapping storages to shards.

use std::collections::BTreeMap;

use filecache_types::{ShardId, StorageId};
use tracing::debug;

use crate::{RouteError, ShardRouter};

/// A storage whose shard changes between two ring states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// The storage that must move.
    pub storage: StorageId,
    /// The shard that holds it today.
    pub from: ShardId,
    /// The shard that should hold it after the change.
    pub to: ShardId,
}

/// Consistent hashing ring for storage placement.
///
/// Each shard is mapped to `weight` virtual nodes on a u64 ring. A storage
/// belongs to the first vnode found walking clockwise from the storage's
/// position, so adding or removing a shard only moves the storages next to
/// its vnodes.
///
/// The ring never hands out a shard it does not know, and it is never empty
/// once built.
#[derive(Debug, Clone)]
pub struct RingRouter {
    /// Virtual node positions: ring position -> shard.
    vnodes: BTreeMap<u64, ShardId>,
    /// Per-shard weight (number of vnodes).
    shards: BTreeMap<ShardId, u16>,
    /// Base number of vnodes for a shard added without explicit weight.
    vnodes_per_shard: u16,
    /// A known shard, answered when no vnode is left to walk to.
    anchor: ShardId,
}

impl RingRouter {
    /// Build a ring over `shards`, each with `vnodes_per_shard` vnodes.
    pub fn new(
        shards: impl IntoIterator<Item = ShardId>,
        vnodes_per_shard: u16,
    ) -> Result<Self, RouteError> {
        if vnodes_per_shard == 0 {
            return Err(RouteError::NoVnodes);
        }
        let shards: Vec<ShardId> = shards.into_iter().collect();
        let anchor = shards.first().copied().ok_or(RouteError::NoShards)?;
        let mut ring = Self {
            vnodes: BTreeMap::new(),
            shards: BTreeMap::new(),
            vnodes_per_shard,
            anchor,
        };
        for shard in shards {
            ring.place_vnodes(shard, vnodes_per_shard);
        }
        Ok(ring)
    }

    /// Build a ring over the dense topology `0..shard_count`.
    pub fn with_shard_count(shard_count: u32, vnodes_per_shard: u16) -> Result<Self, RouteError> {
        Self::new((0..shard_count).map(ShardId::new), vnodes_per_shard)
    }

    /// Add a shard with the default weight.
    pub fn add_shard(&mut self, shard: ShardId) {
        self.place_vnodes(shard, self.vnodes_per_shard);
    }

    /// Add a shard with an explicit weight. Re-adding replaces the weight.
    ///
    /// A shard with no vnodes could never be routed to, so a weight of 0 is
    /// rejected and the ring is left as it was.
    pub fn add_shard_with_weight(
        &mut self,
        shard: ShardId,
        weight: u16,
    ) -> Result<(), RouteError> {
        if weight == 0 {
            return Err(RouteError::NoVnodes);
        }
        self.place_vnodes(shard, weight);
        Ok(())
    }

    /// Remove a shard. The last shard cannot be removed.
    pub fn remove_shard(&mut self, shard: ShardId) -> Result<(), RouteError> {
        if !self.shards.contains_key(&shard) {
            return Err(RouteError::UnknownShard(shard));
        }
        let survivor = self
            .shards
            .keys()
            .copied()
            .find(|s| *s != shard)
            .ok_or(RouteError::NoShards)?;
        self.drop_vnodes(shard);
        if self.anchor == shard {
            self.anchor = survivor;
        }
        debug!(%shard, "removed shard from ring");
        Ok(())
    }

    fn place_vnodes(&mut self, shard: ShardId, weight: u16) {
        self.drop_vnodes(shard);

        for i in 0..weight {
            self.vnodes.insert(vnode_position(shard, i), shard);
        }
        self.shards.insert(shard, weight);
        debug!(%shard, weight, "added shard to ring");
    }

    fn drop_vnodes(&mut self, shard: ShardId) {
        if let Some(weight) = self.shards.remove(&shard) {
            for i in 0..weight {
                let pos = vnode_position(shard, i);
                // Only drop positions we still own; another shard may have
                // landed on the same slot later.
                if self.vnodes.get(&pos) == Some(&shard) {
                    self.vnodes.remove(&pos);
                }
            }
        }
    }

    /// Storages in `storages` whose shard differs between `old` and `new`.
    pub fn diff(old: &RingRouter, new: &RingRouter, storages: &[StorageId]) -> Vec<Migration> {
        storages
            .iter()
            .filter_map(|&storage| {
                let from = old.route(storage);
                let to = new.route(storage);
                (from != to).then_some(Migration { storage, from, to })
            })
            .collect()
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn vnode_count(&self) -> usize {
        self.vnodes.len()
    }
}

impl ShardRouter for RingRouter {
    fn route(&self, storage: StorageId) -> ShardId {
        let pos = storage_position(storage);
        // Walk clockwise: first vnode at or after `pos`, wrapping to the start.
        self.vnodes
            .range(pos..)
            .chain(self.vnodes.range(..pos))
            .map(|(_, shard)| *shard)
            .next()
            .unwrap_or(self.anchor)
    }

    fn all_shards(&self) -> Vec<ShardId> {
        self.shards.keys().copied().collect()
    }
}

/// Compute a vnode's position: blake3(shard_id ++ vnode_index) truncated to u64.
fn vnode_position(shard: ShardId, vnode_index: u16) -> u64 {
    let mut input = Vec::with_capacity(6);
    input.extend_from_slice(&shard.to_be_bytes());
    input.extend_from_slice(&vnode_index.to_le_bytes());
    hash_to_u64(&input)
}

/// Compute a storage's position: blake3(storage_id) truncated to u64.
fn storage_position(storage: StorageId) -> u64 {
    hash_to_u64(&storage.to_be_bytes())
}

fn hash_to_u64(input: &[u8]) -> u64 {
    let hash = blake3::hash(input);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
