//! In-memory shard backend.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use filecache_types::{FileId, FileRow, Predicate, ShardId};
use tracing::debug;

use crate::error::QueryError;
use crate::traits::ShardQuery;

type ShardMap = BTreeMap<ShardId, BTreeMap<FileId, FileRow>>;

/// In-memory shards backed by a `RwLock<BTreeMap>`.
///
/// Useful for testing and for running the CLI against a dataset file. Rows
/// are kept per shard, keyed by file id, so scans return them in id order.
pub struct MemoryShards {
    shards: RwLock<ShardMap>,
}

impl MemoryShards {
    /// Create a backend with the given (empty) shards.
    pub fn new(shards: impl IntoIterator<Item = ShardId>) -> Self {
        let map = shards.into_iter().map(|s| (s, BTreeMap::new())).collect();
        Self {
            shards: RwLock::new(map),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ShardMap>, QueryError> {
        self.shards.read().map_err(|_| QueryError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ShardMap>, QueryError> {
        self.shards.write().map_err(|_| QueryError::Poisoned)
    }

    /// Add an empty shard. Existing shards are left untouched.
    pub fn add_shard(&self, shard: ShardId) -> Result<(), QueryError> {
        self.write()?.entry(shard).or_default();
        Ok(())
    }

    /// Insert or replace a row in `shard`.
    pub fn insert(&self, shard: ShardId, row: FileRow) -> Result<(), QueryError> {
        let mut map = self.write()?;
        let rows = map
            .get_mut(&shard)
            .ok_or(QueryError::UnknownShard(shard))?;
        debug!(%shard, fileid = %row.fileid, "storing row in memory");
        rows.insert(row.fileid, row);
        Ok(())
    }

    /// Remove a row from `shard`, returning it if it was there.
    pub fn remove(&self, shard: ShardId, file_id: FileId) -> Result<Option<FileRow>, QueryError> {
        let mut map = self.write()?;
        let rows = map
            .get_mut(&shard)
            .ok_or(QueryError::UnknownShard(shard))?;
        Ok(rows.remove(&file_id))
    }

    /// Move a row between shards, as a migration would.
    ///
    /// Returns `false` if `from` does not hold `file_id`.
    pub fn move_row(
        &self,
        file_id: FileId,
        from: ShardId,
        to: ShardId,
    ) -> Result<bool, QueryError> {
        let mut map = self.write()?;
        if !map.contains_key(&to) {
            return Err(QueryError::UnknownShard(to));
        }
        let row = map
            .get_mut(&from)
            .ok_or(QueryError::UnknownShard(from))?
            .remove(&file_id);
        let Some(row) = row else {
            return Ok(false);
        };
        map.entry(to).or_default().insert(file_id, row);
        debug!(%file_id, %from, %to, "moved row between shards");
        Ok(true)
    }

    /// The shard currently holding `file_id`, found by brute force.
    pub fn shard_of(&self, file_id: FileId) -> Result<Option<ShardId>, QueryError> {
        let map = self.read()?;
        Ok(map
            .iter()
            .find(|(_, rows)| rows.contains_key(&file_id))
            .map(|(shard, _)| *shard))
    }

    /// Number of rows in `shard`.
    pub fn len(&self, shard: ShardId) -> Result<usize, QueryError> {
        let map = self.read()?;
        map.get(&shard)
            .map(BTreeMap::len)
            .ok_or(QueryError::UnknownShard(shard))
    }

    /// Number of rows across all shards.
    pub fn total_rows(&self) -> Result<usize, QueryError> {
        Ok(self.read()?.values().map(BTreeMap::len).sum())
    }

    /// Known shard ids in ascending order.
    pub fn shard_ids(&self) -> Result<Vec<ShardId>, QueryError> {
        Ok(self.read()?.keys().copied().collect())
    }
}

#[async_trait::async_trait]
impl ShardQuery for MemoryShards {
    async fn query(
        &self,
        shard: ShardId,
        predicate: &Predicate,
    ) -> Result<Vec<FileRow>, QueryError> {
        let map = self.read()?;
        let rows = map.get(&shard).ok_or(QueryError::UnknownShard(shard))?;
        if predicate.is_unsatisfiable() {
            return Ok(Vec::new());
        }
        Ok(rows
            .values()
            .filter(|row| predicate.matches(row))
            .cloned()
            .collect())
    }
}
