//! Tests for the filecache-access crate.

mod helpers;
