//! Path normalization and hashing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deterministic hash of a normalized path: `blake3(normalize_path(path))`
/// truncated to 16 bytes.
///
/// Path lookups compare hashes instead of full paths so the column stays
/// fixed-width regardless of path length.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PathHash([u8; 16]);

impl PathHash {
    /// Hash a path after normalizing it.
    pub fn of(path: &str) -> Self {
        let normalized = normalize_path(path);
        let hash = blake3::hash(normalized.as_bytes());
        let mut out = [0u8; 16];
        out.copy_from_slice(&hash.as_bytes()[..16]);
        Self(out)
    }

    /// Return the raw 16-byte representation.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl From<[u8; 16]> for PathHash {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PathHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for PathHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathHash({self})")
    }
}

/// Normalize a storage-relative path.
///
/// Leading and trailing `/` are dropped and runs of `/` collapse to one, so
/// `"/files//a/"` and `"files/a"` name the same entry. The storage root is
/// the empty string.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
