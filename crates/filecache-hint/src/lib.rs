//! Location hints: a best-effort `file → shard` cache.
//!
//! A hint records where a file was last seen. It is **never** a source of
//! truth: entries may be missing, evicted or stale after a migration, and
//! every lookup that follows a hint re-checks the record it gets back.
//!
//! Because of that, [`ShardLocationCache`] methods never fail. Backends log
//! internal errors and behave as if the hint was absent.
//!
//! Backends:
//!
//! - [`MemoryLocationCache`]: bounded in-process LRU.
//! - [`FjallLocationCache`]: persistent hints in a Fjall keyspace.
//! - [`NoopLocationCache`]: remembers nothing (hints disabled).

mod error;
mod memory;
mod persistent;

use std::collections::{BTreeMap, HashSet};

use filecache_types::{FileId, ShardId};

pub use error::HintError;
pub use memory::{HintStats, MemoryLocationCache};
pub use persistent::FjallLocationCache;

/// Best-effort mapping from file id to the shard believed to hold it.
pub trait ShardLocationCache: Send + Sync {
    /// The hinted shard for `file_id`, if any.
    fn get(&self, file_id: FileId) -> Option<ShardId>;

    /// Record that `file_id` lives in `shard`, overwriting any prior hint.
    fn set(&self, file_id: FileId, shard: ShardId);

    /// Forget the hint for `file_id`.
    fn remove(&self, file_id: FileId);

    /// Group the hinted subset of `file_ids` by shard.
    ///
    /// Ids without a hint are left out. Within a group ids keep their input
    /// order; duplicates are reported once.
    fn get_many(&self, file_ids: &[FileId]) -> BTreeMap<ShardId, Vec<FileId>> {
        let mut seen = HashSet::with_capacity(file_ids.len());
        let mut groups: BTreeMap<ShardId, Vec<FileId>> = BTreeMap::new();
        for &file_id in file_ids {
            if !seen.insert(file_id) {
                continue;
            }
            if let Some(shard) = self.get(file_id) {
                groups.entry(shard).or_default().push(file_id);
            }
        }
        groups
    }
}

/// A location cache that never remembers anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLocationCache;

impl ShardLocationCache for NoopLocationCache {
    fn get(&self, _file_id: FileId) -> Option<ShardId> {
        None
    }

    fn set(&self, _file_id: FileId, _shard: ShardId) {}

    fn remove(&self, _file_id: FileId) {}
}
