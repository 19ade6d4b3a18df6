//! Raw storage rows and the immutable [`CacheEntry`] built from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{FileId, PathHash, StorageId, normalize_path};

/// Mime type carried by directory entries.
pub const DIRECTORY_MIME_TYPE: &str = "httpd/unix-directory";

/// One row of the file cache as stored in a shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRow {
    /// Globally unique file identifier.
    pub fileid: FileId,
    /// Storage the file belongs to.
    pub storage: StorageId,
    /// Normalized storage-relative path.
    pub path: String,
    /// Hash of `path`, kept in sync by [`FileRow::new`].
    pub path_hash: PathHash,
    /// Parent directory id, `None` for the storage root.
    pub parent: Option<FileId>,
    /// Last path segment.
    pub name: String,
    /// Full mime type (`text/plain`, `httpd/unix-directory`, ...).
    pub mimetype: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification time as seen by clients (unix seconds).
    pub mtime: i64,
    /// Modification time on the backing storage (unix seconds).
    pub storage_mtime: i64,
    /// Change tag.
    pub etag: String,
    /// Permission bitmask.
    pub permissions: u32,
    /// Optional `algo:digest` checksum.
    pub checksum: String,
    /// Whether the content is encrypted at rest.
    pub encrypted: bool,
    /// Columns this layer passes through untouched.
    pub extra: BTreeMap<String, String>,
}

impl FileRow {
    /// Build a row for `path` in `storage`, deriving `path_hash` and `name`.
    ///
    /// Remaining columns start empty; set them directly on the returned row.
    pub fn new(fileid: FileId, storage: StorageId, path: &str) -> Self {
        let path = normalize_path(path);
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            fileid,
            storage,
            path_hash: PathHash::of(&path),
            path,
            parent: None,
            name,
            mimetype: "application/octet-stream".to_string(),
            size: 0,
            mtime: 0,
            storage_mtime: 0,
            etag: String::new(),
            permissions: 0,
            checksum: String::new(),
            encrypted: false,
            extra: BTreeMap::new(),
        }
    }
}

/// Immutable file-cache entry, created fresh from every query response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    row: FileRow,
}

impl CacheEntry {
    /// Build an entry from one storage row.
    pub fn from_row(row: FileRow) -> Self {
        Self { row }
    }

    pub fn id(&self) -> FileId {
        self.row.fileid
    }

    pub fn storage_id(&self) -> StorageId {
        self.row.storage
    }

    pub fn path(&self) -> &str {
        &self.row.path
    }

    pub fn path_hash(&self) -> PathHash {
        self.row.path_hash
    }

    pub fn parent(&self) -> Option<FileId> {
        self.row.parent
    }

    pub fn name(&self) -> &str {
        &self.row.name
    }

    pub fn mime_type(&self) -> &str {
        &self.row.mimetype
    }

    /// Top-level part of the mime type (`text` for `text/plain`).
    pub fn mime_part(&self) -> &str {
        self.row
            .mimetype
            .split_once('/')
            .map_or(self.row.mimetype.as_str(), |(part, _)| part)
    }

    pub fn size(&self) -> u64 {
        self.row.size
    }

    pub fn mtime(&self) -> i64 {
        self.row.mtime
    }

    pub fn storage_mtime(&self) -> i64 {
        self.row.storage_mtime
    }

    pub fn etag(&self) -> &str {
        &self.row.etag
    }

    pub fn permissions(&self) -> u32 {
        self.row.permissions
    }

    pub fn checksum(&self) -> &str {
        &self.row.checksum
    }

    pub fn is_encrypted(&self) -> bool {
        self.row.encrypted
    }

    pub fn is_dir(&self) -> bool {
        self.row.mimetype == DIRECTORY_MIME_TYPE
    }

    /// Look up a pass-through column.
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.row.extra.get(key).map(String::as_str)
    }

    /// Borrow the underlying row.
    pub fn row(&self) -> &FileRow {
        &self.row
    }
}

impl From<FileRow> for CacheEntry {
    fn from(row: FileRow) -> Self {
        Self::from_row(row)
    }
}
