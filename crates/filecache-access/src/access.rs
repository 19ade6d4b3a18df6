//! [`CacheAccess`]: targeted lookups with hint fast paths and fallback scans.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use filecache_hint::ShardLocationCache;
use filecache_route::ShardRouter;
use filecache_shard::ShardQuery;
use filecache_types::{CacheEntry, FileId, Filter, PathHash, Predicate, ShardId, StorageId};
use tracing::debug;

use crate::error::AccessError;

type Result<T> = std::result::Result<T, AccessError>;

/// Lower-level access to the sharded file cache.
///
/// Holds no state of its own besides the three collaborators, so it is cheap
/// to clone and safe to share across tasks.
///
/// Lookups that name a storage trust the router: a miss in the routed shard
/// means the file does not exist there. Lookups by id alone trust nothing but
/// the rows they get back: a hint only picks which shard to ask first.
#[derive(Clone)]
pub struct CacheAccess {
    router: Arc<dyn ShardRouter>,
    hints: Arc<dyn ShardLocationCache>,
    shards: Arc<dyn ShardQuery>,
}

impl CacheAccess {
    pub fn new(
        router: Arc<dyn ShardRouter>,
        hints: Arc<dyn ShardLocationCache>,
        shards: Arc<dyn ShardQuery>,
    ) -> Self {
        Self {
            router,
            hints,
            shards,
        }
    }

    pub fn router(&self) -> &Arc<dyn ShardRouter> {
        &self.router
    }

    pub fn hints(&self) -> &Arc<dyn ShardLocationCache> {
        &self.hints
    }

    /// Look up `file_id` in the shard of `storage`. Never scans other shards.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_by_file_id_in_storage(
        &self,
        file_id: FileId,
        storage: StorageId,
    ) -> Result<Option<CacheEntry>> {
        let shard = self.router.route(storage);
        let entry = self.query_by_file_id_in_shard(file_id, shard).await?;
        if entry.is_some() {
            self.hints.set(file_id, shard);
        }
        Ok(entry)
    }

    /// Look up `path` in `storage`. Never scans other shards.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_by_path_in_storage(
        &self,
        path: &str,
        storage: StorageId,
    ) -> Result<Option<CacheEntry>> {
        let shard = self.router.route(storage);
        let predicate = Predicate::path_hash(PathHash::of(path)).and(Filter::Storage(storage));
        let entry = self
            .shards
            .query(shard, &predicate)
            .await?
            .into_iter()
            .next()
            .map(CacheEntry::from_row);

        if let Some(entry) = &entry {
            self.hints.set(entry.id(), shard);
        }
        Ok(entry)
    }

    /// Look up `file_id` without knowing its storage.
    ///
    /// Tries the hinted shard first. On a miss (no hint, stale hint, or a
    /// hint pointing outside the topology) every other known shard is asked
    /// in router order until one returns the file, and the hint is refreshed.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_by_file_id(&self, file_id: FileId) -> Result<Option<CacheEntry>> {
        let known = self.router.all_shards();
        let hinted = self.hints.get(file_id);

        if let Some(shard) = hinted {
            if known.contains(&shard) {
                let entry = self.query_by_file_id_in_shard(file_id, shard).await?;
                if let Some(entry) = entry.filter(|e| e.id() == file_id) {
                    debug!(%file_id, %shard, "location hint hit");
                    return Ok(Some(entry));
                }
            }
            debug!(%file_id, %shard, "stale location hint");
        }

        for shard in known {
            // The hinted shard was just asked and does not hold the file.
            if hinted == Some(shard) {
                continue;
            }
            let entry = self.query_by_file_id_in_shard(file_id, shard).await?;
            if let Some(entry) = entry.filter(|e| e.id() == file_id) {
                debug!(%file_id, %shard, "found by fallback scan");
                self.hints.set(file_id, shard);
                return Ok(Some(entry));
            }
        }

        if hinted.is_some() {
            self.hints.remove(file_id);
        }
        Ok(None)
    }

    /// Look up many files without knowing their storages.
    ///
    /// Hinted ids are fetched with one query per hinted shard. Whatever is
    /// left is swept across all known shards with one batch query each,
    /// stopping as soon as every id is resolved. Ids that exist nowhere are
    /// absent from the result and lose whatever hint they had.
    #[tracing::instrument(level = "debug", skip_all, fields(count = file_ids.len()))]
    pub async fn get_by_file_ids(
        &self,
        file_ids: &[FileId],
    ) -> Result<BTreeMap<FileId, CacheEntry>> {
        let mut found = BTreeMap::new();
        if file_ids.is_empty() {
            return Ok(found);
        }

        let known = self.router.all_shards();
        let mut hinted = BTreeSet::new();
        for (shard, ids) in self.hints.get_many(file_ids) {
            hinted.extend(ids.iter().copied());
            if !known.contains(&shard) {
                continue;
            }
            let items = self.get_by_file_ids_in_shard(shard, &ids).await?;
            debug!(%shard, hinted = ids.len(), hits = items.len(), "hinted batch");
            found.extend(items);
        }

        let mut remaining: BTreeSet<FileId> = file_ids
            .iter()
            .copied()
            .filter(|id| !found.contains_key(id))
            .collect();

        for shard in known {
            if remaining.is_empty() {
                break;
            }
            let ids: Vec<FileId> = remaining.iter().copied().collect();
            let items = self.get_by_file_ids_in_shard(shard, &ids).await?;
            debug!(%shard, asked = ids.len(), hits = items.len(), "fallback batch");
            for (id, entry) in items {
                self.hints.set(id, shard);
                remaining.remove(&id);
                found.insert(id, entry);
            }
        }

        for id in remaining.intersection(&hinted) {
            self.hints.remove(*id);
        }
        Ok(found)
    }

    /// Look up many files that all belong to `storage`, in that storage's
    /// shard only.
    #[tracing::instrument(level = "debug", skip(self, file_ids), fields(count = file_ids.len()))]
    pub async fn get_by_file_ids_in_storage(
        &self,
        file_ids: &[FileId],
        storage: StorageId,
    ) -> Result<BTreeMap<FileId, CacheEntry>> {
        if file_ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let shard = self.router.route(storage);
        let predicate =
            Predicate::file_ids(file_ids.iter().copied()).and(Filter::Storage(storage));
        let items = self.collect_by_id(shard, &predicate, file_ids).await?;
        for id in items.keys() {
            self.hints.set(*id, shard);
        }
        Ok(items)
    }

    /// Batch query one shard directly. Does not touch location hints.
    pub async fn get_by_file_ids_in_shard(
        &self,
        shard: ShardId,
        file_ids: &[FileId],
    ) -> Result<BTreeMap<FileId, CacheEntry>> {
        if file_ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let predicate = Predicate::file_ids(file_ids.iter().copied());
        self.collect_by_id(shard, &predicate, file_ids).await
    }

    async fn query_by_file_id_in_shard(
        &self,
        file_id: FileId,
        shard: ShardId,
    ) -> Result<Option<CacheEntry>> {
        let rows = self
            .shards
            .query(shard, &Predicate::file_id(file_id))
            .await?;
        Ok(rows.into_iter().next().map(CacheEntry::from_row))
    }

    /// Run `predicate` on `shard` and key the rows by id, keeping only ids
    /// that were asked for.
    async fn collect_by_id(
        &self,
        shard: ShardId,
        predicate: &Predicate,
        wanted: &[FileId],
    ) -> Result<BTreeMap<FileId, CacheEntry>> {
        let wanted: HashSet<FileId> = wanted.iter().copied().collect();
        let rows = self.shards.query(shard, predicate).await?;
        Ok(rows
            .into_iter()
            .filter(|row| wanted.contains(&row.fileid))
            .map(|row| (row.fileid, CacheEntry::from_row(row)))
            .collect())
    }
}
