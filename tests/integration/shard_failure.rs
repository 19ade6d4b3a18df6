//! Integration test: unavailable shards.
//!
//! A failing shard query is an error, never a miss: lookups that reach a
//! down shard fail, lookups that don't are unaffected, and everything
//! works again once the shard comes back.

use filecache_access::AccessError;
use filecache_hint::ShardLocationCache;
use filecache_integration_tests::{IntegrationShards, test_rows_seeded};
use filecache_route::ShardRouter;
use filecache_shard::QueryError;
use filecache_types::FileId;

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_storage_lookup_on_down_shard_fails() {
    let mut c = IntegrationShards::new(4);
    let rows = test_rows_seeded(200, 20, 20);
    c.put_all(&rows);

    let row = &rows[0];
    let home = c.ring().route(row.storage);
    c.kill_shard(home).await;

    let err = c
        .access()
        .get_by_file_id_in_storage(row.fileid, row.storage)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AccessError::Query(QueryError::Unavailable { shard, .. }) if shard == home
    ));
    assert_eq!(c.hints().get(row.fileid), None);

    c.revive_shard(home).await;
    let entry = c
        .access()
        .get_by_file_id_in_storage(row.fileid, row.storage)
        .await
        .unwrap();
    assert_eq!(entry.map(|e| e.id()), Some(row.fileid));
}

/// With warm hints, only files living on the down shard fail.
#[tokio::test]
#[ntest::timeout(30000)]
async fn test_warm_lookups_only_fail_on_down_shard() {
    let mut c = IntegrationShards::new(4);
    let rows = test_rows_seeded(400, 30, 21);
    c.put_all(&rows);
    for row in &rows {
        c.access().get_by_file_id(row.fileid).await.unwrap();
    }

    let down = c.ring().route(rows[0].storage);
    c.kill_shard(down).await;

    for row in &rows {
        let result = c.access().get_by_file_id(row.fileid).await;
        if c.shard_of(row.fileid) == Some(down) {
            assert!(result.is_err(), "{} lives on the down shard", row.fileid);
        } else {
            assert_eq!(result.unwrap().map(|e| e.id()), Some(row.fileid));
        }
    }

    // Failures never clobber hints.
    for row in &rows {
        assert_eq!(c.hints().get(row.fileid), c.shard_of(row.fileid));
    }
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn test_cold_miss_with_down_shard_is_an_error() {
    let c = IntegrationShards::new(3);
    let last = *c.ring().all_shards().last().unwrap();
    c.kill_shard(last).await;

    // Nothing can prove the file is absent while a shard is unreachable.
    let err = c.access().get_by_file_id(FileId::new(12345)).await.unwrap_err();
    assert!(matches!(err, AccessError::Query(_)));

    let err = c
        .access()
        .get_by_file_ids(&[FileId::new(12345)])
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Query(_)));
}
