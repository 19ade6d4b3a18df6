//! Conjunctive row predicates for shard queries.

use std::collections::BTreeSet;
use std::fmt;

use crate::{FileId, FileRow, PathHash, StorageId};

/// A single column filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `fileid = v`
    FileId(FileId),
    /// `fileid IN (...)`. An empty set matches nothing.
    FileIdIn(BTreeSet<FileId>),
    /// `path_hash = v`
    PathHash(PathHash),
    /// `storage = v`
    Storage(StorageId),
}

impl Filter {
    /// Whether `row` passes this filter.
    pub fn matches(&self, row: &FileRow) -> bool {
        match self {
            Filter::FileId(id) => row.fileid == *id,
            Filter::FileIdIn(ids) => ids.contains(&row.fileid),
            Filter::PathHash(hash) => row.path_hash == *hash,
            Filter::Storage(storage) => row.storage == *storage,
        }
    }
}

/// Conjunction of [`Filter`]s. The empty predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    filters: Vec<Filter>,
}

impl Predicate {
    /// `fileid = id`
    pub fn file_id(id: FileId) -> Self {
        Self::default().and(Filter::FileId(id))
    }

    /// `fileid IN ids`
    pub fn file_ids<I: IntoIterator<Item = FileId>>(ids: I) -> Self {
        Self::default().and(Filter::FileIdIn(ids.into_iter().collect()))
    }

    /// `path_hash = hash`
    pub fn path_hash(hash: PathHash) -> Self {
        Self::default().and(Filter::PathHash(hash))
    }

    /// `storage = storage`
    pub fn storage(storage: StorageId) -> Self {
        Self::default().and(Filter::Storage(storage))
    }

    /// Add another filter to the conjunction.
    pub fn and(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Whether `row` passes every filter.
    pub fn matches(&self, row: &FileRow) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Whether the predicate can never match (contains an empty `IN` set).
    pub fn is_unsatisfiable(&self) -> bool {
        self.filters
            .iter()
            .any(|f| matches!(f, Filter::FileIdIn(ids) if ids.is_empty()))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filters.is_empty() {
            return write!(f, "true");
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            match filter {
                Filter::FileId(id) => write!(f, "fileid = {id}")?,
                Filter::FileIdIn(ids) => {
                    let list: Vec<String> = ids.iter().map(ToString::to_string).collect();
                    write!(f, "fileid IN ({})", list.join(", "))?;
                }
                Filter::PathHash(hash) => write!(f, "path_hash = {hash}")?,
                Filter::Storage(storage) => write!(f, "storage = {storage}")?,
            }
        }
        Ok(())
    }
}
