//! Bounded in-process LRU of location hints.

use std::collections::{BTreeMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use filecache_types::{FileId, ShardId};
use lru::LruCache;
use tracing::{debug, warn};

use crate::ShardLocationCache;

/// Hit/miss counters for a [`MemoryLocationCache`].
#[derive(Debug, Default)]
pub struct HintStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub writes: AtomicU64,
}

impl HintStats {
    /// Fraction of reads that found a hint (0.0 when nothing was read).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Thread-safe LRU of `file → shard` hints, bounded by entry count.
///
/// All operations take a single lock; the critical section is pure
/// in-memory work with no I/O. A poisoned lock makes the cache behave as
/// empty rather than failing the caller.
pub struct MemoryLocationCache {
    /// `None` when built with capacity 0 (caching disabled).
    inner: Option<Mutex<LruCache<FileId, ShardId>>>,
    stats: HintStats,
}

impl MemoryLocationCache {
    /// Create a cache holding at most `capacity` hints.
    ///
    /// A `capacity` of 0 disables caching entirely.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            stats: HintStats::default(),
        }
    }

    /// Current number of hints.
    pub fn len(&self) -> usize {
        self.with_cache(|cache| cache.len()).unwrap_or(0)
    }

    /// Whether no hints are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> &HintStats {
        &self.stats
    }

    fn with_cache<T>(&self, f: impl FnOnce(&mut LruCache<FileId, ShardId>) -> T) -> Option<T> {
        let lock = self.inner.as_ref()?;
        match lock.lock() {
            Ok(mut cache) => Some(f(&mut cache)),
            Err(_) => {
                warn!("location cache lock poisoned, treating as empty");
                None
            }
        }
    }

    fn record(&self, found: bool) {
        let counter = if found {
            &self.stats.hits
        } else {
            &self.stats.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl ShardLocationCache for MemoryLocationCache {
    fn get(&self, file_id: FileId) -> Option<ShardId> {
        let shard = self.with_cache(|cache| cache.get(&file_id).copied()).flatten();
        self.record(shard.is_some());
        shard
    }

    fn set(&self, file_id: FileId, shard: ShardId) {
        let evicted = self.with_cache(|cache| cache.push(file_id, shard)).flatten();
        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        if let Some((old_id, _)) = evicted.filter(|(old_id, _)| *old_id != file_id) {
            debug!(evicted = %old_id, "evicted location hint");
        }
    }

    fn remove(&self, file_id: FileId) {
        self.with_cache(|cache| cache.pop(&file_id));
    }

    fn get_many(&self, file_ids: &[FileId]) -> BTreeMap<ShardId, Vec<FileId>> {
        let mut seen = HashSet::with_capacity(file_ids.len());
        let mut groups: BTreeMap<ShardId, Vec<FileId>> = BTreeMap::new();
        self.with_cache(|cache| {
            for &file_id in file_ids {
                if !seen.insert(file_id) {
                    continue;
                }
                let shard = cache.get(&file_id).copied();
                self.record(shard.is_some());
                if let Some(shard) = shard {
                    groups.entry(shard).or_default().push(file_id);
                }
            }
        });
        groups
    }
}
