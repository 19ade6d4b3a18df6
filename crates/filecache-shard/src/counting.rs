//! A [`ShardQuery`] wrapper that records every query it forwards.

use std::sync::{Arc, Mutex};

use filecache_types::{FileRow, Predicate, ShardId};

use crate::error::QueryError;
use crate::traits::ShardQuery;

/// One query seen by a [`CountingQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCall {
    pub shard: ShardId,
    pub predicate: Predicate,
}

/// Wraps any `Arc<dyn ShardQuery>` and logs each `(shard, predicate)` pair
/// before forwarding it.
///
/// Used by tests to assert how many roundtrips a lookup cost, and by the CLI
/// benchmark to report them.
pub struct CountingQuery {
    inner: Arc<dyn ShardQuery>,
    calls: Mutex<Vec<QueryCall>>,
}

impl CountingQuery {
    pub fn new(inner: Arc<dyn ShardQuery>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every query forwarded so far, oldest first.
    pub fn calls(&self) -> Vec<QueryCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    /// Shards queried so far, in call order.
    pub fn shards_queried(&self) -> Vec<ShardId> {
        self.calls().into_iter().map(|c| c.shard).collect()
    }

    /// Number of queries sent to `shard`.
    pub fn calls_to(&self, shard: ShardId) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.shard == shard)
            .count()
    }

    /// Forget the recorded calls.
    pub fn reset(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}

#[async_trait::async_trait]
impl ShardQuery for CountingQuery {
    async fn query(
        &self,
        shard: ShardId,
        predicate: &Predicate,
    ) -> Result<Vec<FileRow>, QueryError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(QueryCall {
                shard,
                predicate: predicate.clone(),
            });
        }
        self.inner.query(shard, predicate).await
    }
}
