//! Integration test: Fjall-backed location hints.
//!
//! Hints written by one process are used by the next, and a hint store
//! left over from a different topology only costs extra queries.

use std::sync::Arc;

use filecache_hint::{FjallLocationCache, NoopLocationCache, ShardLocationCache};
use filecache_integration_tests::{IntegrationShards, test_rows_seeded};

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_hints_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let rows = test_rows_seeded(300, 20, 30);

    {
        let hints = Arc::new(FjallLocationCache::open(dir.path()).unwrap());
        let mut c = IntegrationShards::with_hints(4, hints);
        c.put_all(&rows);
        for row in &rows {
            c.access().get_by_file_id(row.fileid).await.unwrap().unwrap();
        }
    }

    let hints = Arc::new(FjallLocationCache::open(dir.path()).unwrap());
    assert_eq!(hints.len().unwrap(), rows.len());
    let mut c = IntegrationShards::with_hints(4, hints);
    c.put_all(&rows);

    c.reset_queries();
    for row in &rows {
        let entry = c.access().get_by_file_id(row.fileid).await.unwrap().unwrap();
        assert_eq!(entry.row(), row);
    }
    assert_eq!(c.query_count(), rows.len());
}

/// Reopen the hint store against a larger topology: results stay correct.
#[tokio::test]
#[ntest::timeout(30000)]
async fn test_hints_from_other_topology_are_harmless() {
    let dir = tempfile::tempdir().unwrap();
    let rows = test_rows_seeded(300, 20, 31);

    {
        let hints = Arc::new(FjallLocationCache::open(dir.path()).unwrap());
        let mut c = IntegrationShards::with_hints(3, hints);
        c.put_all(&rows);
        for row in &rows {
            c.access().get_by_file_id(row.fileid).await.unwrap().unwrap();
        }
    }

    let hints = Arc::new(FjallLocationCache::open(dir.path()).unwrap());
    let mut c = IntegrationShards::with_hints(7, hints);
    c.put_all(&rows);

    for row in &rows {
        let entry = c.access().get_by_file_id(row.fileid).await.unwrap();
        assert_eq!(entry.map(|e| e.id()), Some(row.fileid));
        assert_eq!(c.hints().get(row.fileid), c.shard_of(row.fileid));
    }
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_no_hints_still_correct() {
    let mut c = IntegrationShards::with_hints(4, Arc::new(NoopLocationCache));
    let rows = test_rows_seeded(200, 10, 32);
    c.put_all(&rows);

    for _ in 0..2 {
        for row in &rows {
            let entry = c.access().get_by_file_id(row.fileid).await.unwrap();
            assert_eq!(entry.map(|e| e.id()), Some(row.fileid));
        }
    }
    assert_eq!(c.hints().get(rows[0].fileid), None);
}
