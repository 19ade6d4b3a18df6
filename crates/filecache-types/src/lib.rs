//! Shared types and identifiers for the sharded file cache.
//!
//! This crate defines the vocabulary used across the workspace:
//! identifiers ([`FileId`], [`StorageId`], [`ShardId`], [`PathHash`]),
//! the raw storage row ([`FileRow`]) and the immutable value built from it
//! ([`CacheEntry`]), and the conjunctive [`Predicate`] a shard query is
//! filtered by.

use std::fmt;

use serde::{Deserialize, Serialize};

mod entry;
mod path;
mod predicate;

pub use entry::{CacheEntry, DIRECTORY_MIME_TYPE, FileRow};
pub use path::{PathHash, normalize_path};
pub use predicate::{Filter, Predicate};

// ---------------------------------------------------------------------------
// ID types
// ---------------------------------------------------------------------------

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Create an ID from its raw integer value.
            pub const fn new(raw: $inner) -> Self {
                Self(raw)
            }

            /// Return the raw integer value.
            pub const fn get(&self) -> $inner {
                self.0
            }

            /// Big-endian byte encoding, used as a sortable storage key.
            pub fn to_be_bytes(&self) -> [u8; std::mem::size_of::<$inner>()] {
                self.0.to_be_bytes()
            }
        }

        impl From<$inner> for $name {
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a logical file, unique across the whole partitioned space.
    FileId(u64)
);

define_id!(
    /// Identifier of the physical storage a file belongs to.
    ///
    /// A storage always lives in exactly one shard, picked by the shard router.
    StorageId(u64)
);

define_id!(
    /// Identifier of one partition of the file cache.
    ShardId(u32)
);
