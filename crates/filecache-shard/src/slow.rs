//! A [`ShardQuery`] wrapper that adds configurable random query latency.
//!
//! `SlowShards` wraps any `Arc<dyn ShardQuery>` and sleeps for a random
//! duration before each query. The RNG is seeded for deterministic,
//! reproducible behaviour across test runs.
//!
//! # Example
//!
//! ```ignore
//! let slow = SlowShards::new(inner)
//!     .latency(1, 5)  // 1–5 ms per query
//!     .seed(42);
//! ```

use std::sync::{Arc, Mutex};

use filecache_types::{FileRow, Predicate, ShardId};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::QueryError;
use crate::traits::ShardQuery;

/// A [`ShardQuery`] wrapper that injects random latency before each query.
///
/// Useful for concurrency tests: interleavings that never happen against an
/// instant in-memory backend show up once queries take real time.
pub struct SlowShards {
    inner: Arc<dyn ShardQuery>,
    latency_ms: (u64, u64),
    rng: Mutex<StdRng>,
}

impl SlowShards {
    /// Wrap an existing backend with zero latency (pass-through) by default.
    pub fn new(inner: Arc<dyn ShardQuery>) -> Self {
        Self {
            inner,
            latency_ms: (0, 0),
            rng: Mutex::new(StdRng::seed_from_u64(0)),
        }
    }

    /// Set the query latency range in milliseconds (uniform random).
    pub fn latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.latency_ms = (min_ms, max_ms);
        self
    }

    /// Set the RNG seed for deterministic behaviour.
    pub fn seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Sleep for a random duration in `[min, max]` milliseconds.
    async fn delay(&self) {
        let (min, max) = self.latency_ms;

        if max == 0 {
            return;
        }

        let ms = if min >= max {
            min
        } else {
            match self.rng.lock() {
                Ok(mut rng) => rng.random_range(min..=max),
                Err(_) => min,
            }
        };

        if ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait::async_trait]
impl ShardQuery for SlowShards {
    async fn query(
        &self,
        shard: ShardId,
        predicate: &Predicate,
    ) -> Result<Vec<FileRow>, QueryError> {
        self.delay().await;
        self.inner.query(shard, predicate).await
    }
}
