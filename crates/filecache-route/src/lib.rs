//! Storage → shard routing.
//!
//! A [`ShardRouter`] answers two questions: which shard holds a given storage
//! (the *targeted* path), and which shards exist at all (the *fallback scan*
//! path). Routing is pure and total; the topology is fixed when the router is
//! built.
//!
//! Three routers are provided:
//!
//! - [`ModuloRouter`]: `storage % shard_count`.
//! - [`RingRouter`]: consistent hashing with virtual nodes, so adding a shard
//!   only moves a fraction of storages.
//! - [`StaticRouter`]: explicit assignment table with an explicit scan order,
//!   for deterministic replay.

mod error;
mod modulo;
mod ring;
mod table;

pub use error::RouteError;
pub use modulo::ModuloRouter;
pub use ring::{Migration, RingRouter};
pub use table::StaticRouter;

use filecache_types::{ShardId, StorageId};

/// Maps storages to shards and enumerates the known shards.
pub trait ShardRouter: Send + Sync {
    /// The shard holding `storage`. Same input, same output, for the
    /// lifetime of the router.
    fn route(&self, storage: StorageId) -> ShardId;

    /// Every known shard, in the order fallback scans visit them.
    fn all_shards(&self) -> Vec<ShardId>;
}
