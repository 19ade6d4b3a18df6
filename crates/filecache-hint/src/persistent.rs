//! [`FjallLocationCache`]: location hints persisted in a Fjall keyspace.

use std::path::Path;

use filecache_types::{FileId, ShardId};
use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::{HintError, ShardLocationCache};

type Result<T> = std::result::Result<T, HintError>;

/// Location hints that survive restarts.
///
/// Everything stored here is reconstructible by scanning the shards, so the
/// store is treated as disposable: read or write errors are logged and the
/// lookup proceeds as if no hint existed.
pub struct FjallLocationCache {
    /// Holds the database open for as long as `locations` is in use.
    _db: Database,
    /// FileId (8 bytes BE) → postcard-encoded ShardId.
    locations: Keyspace,
    /// Keeps the directory of a temporary store alive.
    _tmp: Option<TempDir>,
}

impl FjallLocationCache {
    /// Open a persistent hint store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::builder(path).open()?;
        Self::init_keyspace(db, None)
    }

    /// Open a temporary hint store that is cleaned up on drop.
    ///
    /// Useful for tests.
    pub fn open_temporary() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let db = Database::builder(tmp.path()).temporary(true).open()?;
        Self::init_keyspace(db, Some(tmp))
    }

    fn init_keyspace(db: Database, tmp: Option<TempDir>) -> Result<Self> {
        let locations = db.keyspace("locations", KeyspaceCreateOptions::default)?;
        Ok(Self {
            _db: db,
            locations,
            _tmp: tmp,
        })
    }

    fn try_get(&self, file_id: FileId) -> Result<Option<ShardId>> {
        match self.locations.get(&file_id.to_be_bytes())? {
            Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn try_set(&self, file_id: FileId, shard: ShardId) -> Result<()> {
        let value = postcard::to_allocvec(&shard)?;
        self.locations
            .insert(&file_id.to_be_bytes(), value.as_slice())?;
        Ok(())
    }

    fn try_remove(&self, file_id: FileId) -> Result<()> {
        self.locations.remove(&file_id.to_be_bytes())?;
        Ok(())
    }

    /// Return the number of stored hints.
    ///
    /// Note: this is an O(n) scan.
    pub fn len(&self) -> Result<usize> {
        let mut count = 0;
        for guard in self.locations.iter() {
            let key = guard.key()?;
            if key.len() != 8 {
                return Err(HintError::MalformedKey(key.len()));
            }
            count += 1;
        }
        Ok(count)
    }

    /// Whether the store holds no hints.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl ShardLocationCache for FjallLocationCache {
    fn get(&self, file_id: FileId) -> Option<ShardId> {
        match self.try_get(file_id) {
            Ok(shard) => shard,
            Err(e) => {
                warn!(%file_id, error = %e, "failed to read location hint");
                None
            }
        }
    }

    fn set(&self, file_id: FileId, shard: ShardId) {
        match self.try_set(file_id, shard) {
            Ok(()) => debug!(%file_id, %shard, "stored location hint"),
            Err(e) => warn!(%file_id, %shard, error = %e, "failed to store location hint"),
        }
    }

    fn remove(&self, file_id: FileId) {
        if let Err(e) = self.try_remove(file_id) {
            warn!(%file_id, error = %e, "failed to remove location hint");
        }
    }
}
