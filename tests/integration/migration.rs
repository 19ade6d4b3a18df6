//! Integration test: storages migrating between shards.
//!
//! Warm every hint, then grow or shrink the ring so some storages move.
//! Hints for the moved files are now stale; lookups must still return the
//! right rows and repair the hints as they go.

use filecache_hint::ShardLocationCache;
use filecache_integration_tests::{IntegrationShards, test_rows_seeded};
use filecache_route::ShardRouter;
use filecache_types::{FileId, FileRow, StorageId};

async fn warm(c: &IntegrationShards, rows: &[FileRow]) {
    for row in rows {
        c.access().get_by_file_id(row.fileid).await.unwrap().unwrap();
    }
}

fn moved_rows<'a>(rows: &'a [FileRow], moved: &[StorageId]) -> Vec<&'a FileRow> {
    rows.iter().filter(|r| moved.contains(&r.storage)).collect()
}

/// 4 shards, add a fifth. Moved files cost one extra query on their next
/// lookup, then go back to one query.
#[tokio::test]
#[ntest::timeout(30000)]
async fn test_add_shard_stale_hints_are_repaired() {
    let mut c = IntegrationShards::new(4);
    let rows = test_rows_seeded(1000, 64, 10);
    c.put_all(&rows);
    warm(&c, &rows).await;

    let (new_shard, migrations) = c.add_shard();
    assert!(!migrations.is_empty(), "a new shard should take some storages");
    assert!(migrations.iter().all(|m| m.to == new_shard));
    assert_eq!(c.ring().shard_count(), 5);

    let moved: Vec<StorageId> = migrations.iter().map(|m| m.storage).collect();
    let moved = moved_rows(&rows, &moved);
    assert!(!moved.is_empty());

    for row in &moved {
        assert_eq!(c.shard_of(row.fileid), Some(new_shard));
        assert_eq!(c.hints().get(row.fileid).map(|s| s != new_shard), Some(true));
    }

    // Everything is still found, whether its hint is stale or not.
    c.reset_queries();
    for row in &rows {
        let entry = c.access().get_by_file_id(row.fileid).await.unwrap().unwrap();
        assert_eq!(entry.row(), row);
    }
    assert!(c.query_count() > rows.len());

    for row in &moved {
        assert_eq!(c.hints().get(row.fileid), Some(new_shard));
    }

    // Hints are repaired: one query per lookup again.
    c.reset_queries();
    warm(&c, &rows).await;
    assert_eq!(c.query_count(), rows.len());
}

/// Removing a shard leaves hints pointing outside the topology. They are
/// ignored without querying the removed shard.
#[tokio::test]
#[ntest::timeout(30000)]
async fn test_remove_shard_hints_outside_topology() {
    let mut c = IntegrationShards::new(5);
    let rows = test_rows_seeded(600, 40, 11);
    c.put_all(&rows);
    warm(&c, &rows).await;

    let gone = c.ring().route(rows[0].storage);
    let migrations = c.remove_shard(gone);
    assert!(migrations.iter().all(|m| m.from == gone && m.to != gone));
    assert!(!c.ring().all_shards().contains(&gone));

    c.reset_queries();
    for row in &rows {
        let entry = c.access().get_by_file_id(row.fileid).await.unwrap();
        assert_eq!(entry.map(|e| e.id()), Some(row.fileid));
    }
    assert!(!c.shards_queried().contains(&gone));

    for row in &rows {
        let hinted = c.hints().get(row.fileid).unwrap();
        assert_ne!(hinted, gone);
        assert_eq!(Some(hinted), c.shard_of(row.fileid));
    }
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_batch_after_migration() {
    let mut c = IntegrationShards::new(3);
    let rows = test_rows_seeded(500, 30, 12);
    c.put_all(&rows);
    let ids: Vec<FileId> = rows.iter().map(|r| r.fileid).collect();
    c.access().get_by_file_ids(&ids).await.unwrap();

    c.add_shard();
    c.add_shard();

    let found = c.access().get_by_file_ids(&ids).await.unwrap();
    assert_eq!(found.len(), rows.len());
    for row in &rows {
        assert_eq!(found[&row.fileid].row(), row);
        assert_eq!(c.hints().get(row.fileid), c.shard_of(row.fileid));
    }
}

/// Storage-scoped lookups follow the router, so they see migrations
/// immediately and never depend on hints.
#[tokio::test]
#[ntest::timeout(30000)]
async fn test_storage_scoped_lookups_follow_the_ring() {
    let mut c = IntegrationShards::new(4);
    let rows = test_rows_seeded(300, 32, 13);
    c.put_all(&rows);
    warm(&c, &rows).await;

    c.add_shard();

    for row in &rows {
        c.reset_queries();
        let entry = c
            .access()
            .get_by_path_in_storage(&row.path, row.storage)
            .await
            .unwrap();
        assert_eq!(entry.map(|e| e.id()), Some(row.fileid));
        assert_eq!(c.query_count(), 1);
    }
}
