//! Shared test utilities for filecache-access tests.

use std::collections::BTreeSet;
use std::sync::Arc;

use filecache_hint::{MemoryLocationCache, ShardLocationCache};
use filecache_route::{ShardRouter, StaticRouter};
use filecache_shard::{CountingQuery, MemoryShards, QueryError, ShardQuery};
use filecache_types::{FileId, FileRow, Predicate, ShardId, StorageId};

use crate::CacheAccess;

pub const HINT_CAPACITY: usize = 10_000;

pub fn id(n: u64) -> FileId {
    FileId::new(n)
}

pub fn shard(n: u32) -> ShardId {
    ShardId::new(n)
}

pub fn storage(n: u64) -> StorageId {
    StorageId::new(n)
}

pub fn row(file: u64, storage_id: u64, path: &str) -> FileRow {
    FileRow::new(id(file), storage(storage_id), path)
}

/// A lookup stack over in-memory shards with every query recorded.
pub struct Fixture {
    pub access: CacheAccess,
    pub router: Arc<dyn ShardRouter>,
    pub shards: Arc<MemoryShards>,
    pub counting: Arc<CountingQuery>,
    pub hints: Arc<MemoryLocationCache>,
}

impl Fixture {
    pub fn new(router: Arc<dyn ShardRouter>) -> Self {
        let shards = Arc::new(MemoryShards::new(router.all_shards()));
        let counting = Arc::new(CountingQuery::new(shards.clone()));
        let hints = Arc::new(MemoryLocationCache::new(HINT_CAPACITY));
        let access = CacheAccess::new(router.clone(), hints.clone(), counting.clone());
        Self {
            access,
            router,
            shards,
            counting,
            hints,
        }
    }

    /// Store a row in the shard its storage routes to.
    pub fn put(&self, row: FileRow) -> ShardId {
        let target = self.router.route(row.storage);
        self.shards.insert(target, row).unwrap();
        target
    }

    /// Store a row in an explicit shard, bypassing the router.
    pub fn put_in(&self, target: ShardId, row: FileRow) {
        self.shards.insert(target, row).unwrap();
    }
}

/// The 4-shard topology used by most scenarios: shards scanned 0, 1, 2, 3;
/// storage `100 + n` lives in shard `n`, anything else in shard 0.
pub fn four_shards() -> Fixture {
    let mut router = StaticRouter::new((0..4).map(shard).collect(), shard(0)).unwrap();
    for n in 0..4u32 {
        router = router.assign(storage(100 + u64::from(n)), shard(n)).unwrap();
    }
    Fixture::new(Arc::new(router))
}

/// Same shards as [`four_shards`], custom scan order.
pub fn four_shards_in_order(order: &[u32]) -> Fixture {
    let order = order.iter().copied().map(shard).collect();
    let mut router = StaticRouter::new(order, shard(0)).unwrap();
    for n in 0..4u32 {
        router = router.assign(storage(100 + u64::from(n)), shard(n)).unwrap();
    }
    Fixture::new(Arc::new(router))
}

/// Wraps a backend and fails every query sent to the listed shards.
pub struct FailingShards {
    inner: Arc<dyn ShardQuery>,
    down: BTreeSet<ShardId>,
}

impl FailingShards {
    pub fn new(inner: Arc<dyn ShardQuery>, down: impl IntoIterator<Item = ShardId>) -> Self {
        Self {
            inner,
            down: down.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl ShardQuery for FailingShards {
    async fn query(
        &self,
        target: ShardId,
        predicate: &Predicate,
    ) -> Result<Vec<FileRow>, QueryError> {
        if self.down.contains(&target) {
            return Err(QueryError::Unavailable {
                shard: target,
                reason: "connection refused".to_string(),
            });
        }
        self.inner.query(target, predicate).await
    }
}

/// Wraps a backend and answers every query sent to `loose` with the whole
/// shard, whatever the predicate asked for.
pub struct LooseShard {
    inner: Arc<dyn ShardQuery>,
    loose: ShardId,
}

impl LooseShard {
    pub fn new(inner: Arc<dyn ShardQuery>, loose: ShardId) -> Self {
        Self { inner, loose }
    }
}

#[async_trait::async_trait]
impl ShardQuery for LooseShard {
    async fn query(
        &self,
        target: ShardId,
        predicate: &Predicate,
    ) -> Result<Vec<FileRow>, QueryError> {
        if target == self.loose {
            return self.inner.query(target, &Predicate::default()).await;
        }
        self.inner.query(target, predicate).await
    }
}

/// The hint currently stored for `file`.
pub fn hint_of(hints: &dyn ShardLocationCache, file: u64) -> Option<ShardId> {
    hints.get(id(file))
}
