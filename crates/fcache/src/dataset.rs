//! Dataset files: `[[rows]]` tables loaded into in-memory shards.
//!
//! ```toml
//! [[rows]]
//! fileid = 42
//! storage = 100
//! path = "files/report.pdf"
//! mimetype = "application/pdf"
//! size = 1024
//! ```
//!
//! Only `fileid`, `storage` and `path` are required. `name` and `path_hash`
//! are always derived from `path`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use filecache_route::ShardRouter;
use filecache_shard::MemoryShards;
use filecache_types::{FileId, FileRow, StorageId};
use serde::Deserialize;
use tracing::debug;

/// A dataset file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub rows: Vec<DatasetRow>,
}

/// One `[[rows]]` table.
#[derive(Debug, Deserialize)]
pub struct DatasetRow {
    pub fileid: u64,
    pub storage: u64,
    pub path: String,
    #[serde(default)]
    pub parent: Option<u64>,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mtime: i64,
    #[serde(default)]
    pub storage_mtime: Option<i64>,
    #[serde(default)]
    pub etag: String,
    #[serde(default)]
    pub permissions: u32,
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl DatasetRow {
    pub fn into_row(self) -> FileRow {
        let mut row = FileRow::new(
            FileId::new(self.fileid),
            StorageId::new(self.storage),
            &self.path,
        );
        row.parent = self.parent.map(FileId::new);
        if let Some(mimetype) = self.mimetype {
            row.mimetype = mimetype;
        }
        row.size = self.size;
        row.mtime = self.mtime;
        row.storage_mtime = self.storage_mtime.unwrap_or(self.mtime);
        row.etag = self.etag;
        row.permissions = self.permissions;
        row.checksum = self.checksum;
        row.encrypted = self.encrypted;
        row.extra = self.extra;
        row
    }
}

impl Dataset {
    /// Read a dataset from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("failed to parse dataset {}", path.display()))
    }

    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Place every row in the shard its storage routes to.
    ///
    /// Returns the number of rows inserted. A later row with the same file
    /// id and shard replaces the earlier one.
    pub fn populate(
        self,
        router: &dyn ShardRouter,
        shards: &MemoryShards,
    ) -> anyhow::Result<usize> {
        let count = self.rows.len();
        for row in self.rows {
            let row = row.into_row();
            let shard = router.route(row.storage);
            debug!(fileid = %row.fileid, storage = %row.storage, %shard, "loading row");
            shards.insert(shard, row)?;
        }
        Ok(count)
    }
}
