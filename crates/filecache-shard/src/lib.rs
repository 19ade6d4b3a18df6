//! Shard query primitive and backends.
//!
//! This crate defines the [`ShardQuery`] trait ("run this predicate against
//! that shard"), which is the only way the lookup layer touches stored rows,
//! along with implementations:
//!
//! - [`MemoryShards`]: in-memory shards backed by a `RwLock<BTreeMap>`.
//! - [`CountingQuery`]: wrapper recording every query issued.
//! - [`SlowShards`]: wrapper injecting seeded random latency.

mod counting;
mod error;
mod memory;
mod slow;
mod traits;

pub use counting::{CountingQuery, QueryCall};
pub use error::QueryError;
pub use memory::MemoryShards;
pub use slow::SlowShards;
pub use traits::ShardQuery;
