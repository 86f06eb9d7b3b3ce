//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 写入失败与缓存同步失败的集成测试

#[path = "../common/mod.rs"]
mod common;

use async_trait::async_trait;
use cachecoord::backend::KeyValueStore;
use cachecoord::config::MissLockMode;
use cachecoord::database::RecordStore;
use cachecoord::error::Result;
use cachecoord::{CacheCoordinator, CacheError, Lookup, User};
use common::{cache_config, setup_logging, sqlite_store, FlakyCache};
use mockall::mock;
use mockall::predicate::eq;
use std::sync::Arc;

mock! {
    pub Records {}

    #[async_trait]
    impl RecordStore for Records {
        async fn insert(&self, user: &User) -> Result<u64>;
        async fn update_selective(&self, user: &User) -> Result<u64>;
        async fn delete_by_key(&self, id: i32) -> Result<u64>;
        async fn select_by_key(&self, id: i32) -> Result<Option<User>>;
        async fn select_all(&self) -> Result<Vec<User>>;
    }
}

mock! {
    pub Cache {}

    #[async_trait]
    impl KeyValueStore for Cache {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
        async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;
        async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<()>;
        async fn set_if_absent_with_ttl(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<bool>;
        async fn delete(&self, key: &str) -> Result<()>;
        async fn set_bit(&self, key: &str, position: u64, value: bool) -> Result<()>;
        async fn get_bits(&self, key: &str) -> Result<Option<Vec<u8>>>;
    }
}

fn coordinator(records: MockRecords, cache: MockCache) -> CacheCoordinator {
    setup_logging();
    CacheCoordinator::new(
        Arc::new(records),
        Arc::new(cache),
        cache_config(MissLockMode::Global),
    )
}

/// 不允许任何调用的缓存，用于断言缓存未被触碰
fn untouchable_cache() -> MockCache {
    let mut cache = MockCache::new();
    cache.expect_get().times(0);
    cache.expect_set().times(0);
    cache.expect_set_with_ttl().times(0);
    cache.expect_set_if_absent_with_ttl().times(0);
    cache.expect_delete().times(0);
    cache
}

#[tokio::test]
async fn test_insert_affecting_no_rows_skips_cache() {
    let mut records = MockRecords::new();
    records.expect_insert().times(1).returning(|_| Ok(0));
    records.expect_select_by_key().times(0);

    let err = coordinator(records, untouchable_cache())
        .create(&User::with_id(1).username("a"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CacheError::WriteFailure {
            operation: "insert",
            id: 1
        }
    ));
}

#[tokio::test]
async fn test_update_affecting_no_rows_skips_cache() {
    let mut records = MockRecords::new();
    records
        .expect_update_selective()
        .withf(|user| user.id == 2)
        .times(1)
        .returning(|_| Ok(0));
    records.expect_select_by_key().times(0);

    let err = coordinator(records, untouchable_cache())
        .update(&User::with_id(2).sex(0))
        .await
        .unwrap_err();

    assert!(err.is_write_failure());
}

#[tokio::test]
async fn test_delete_affecting_no_rows_skips_cache() {
    let mut records = MockRecords::new();
    records
        .expect_delete_by_key()
        .with(eq(3))
        .times(1)
        .returning(|_| Ok(0));

    let err = coordinator(records, untouchable_cache())
        .delete(3)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CacheError::WriteFailure {
            operation: "delete",
            id: 3
        }
    ));
}

#[tokio::test]
async fn test_store_error_propagates_without_cache_write() {
    let mut records = MockRecords::new();
    records
        .expect_insert()
        .times(1)
        .returning(|_| Err(CacheError::BackendError("disk full".to_string())));

    let err = coordinator(records, untouchable_cache())
        .create(&User::with_id(4))
        .await
        .unwrap_err();

    assert!(matches!(err, CacheError::BackendError(_)));
}

#[tokio::test]
async fn test_cache_set_failure_after_store_write() {
    let mut records = MockRecords::new();
    records.expect_insert().times(1).returning(|_| Ok(1));
    records
        .expect_select_by_key()
        .with(eq(5))
        .times(1)
        .returning(|id| Ok(Some(User::with_id(id).username("five"))));

    let mut cache = MockCache::new();
    cache
        .expect_set()
        .withf(|key, _| key == "user:5")
        .times(1)
        .returning(|_, _| Err(CacheError::BackendError("connection reset".to_string())));

    let err = coordinator(records, cache)
        .create(&User::with_id(5).username("five"))
        .await
        .unwrap_err();

    match err {
        CacheError::CacheWriteFailure { key, reason } => {
            assert_eq!(key, "user:5");
            assert!(reason.contains("connection reset"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_vanished_record_invalidates_cache() {
    let mut records = MockRecords::new();
    records.expect_update_selective().times(1).returning(|_| Ok(1));
    records
        .expect_select_by_key()
        .times(1)
        .returning(|_| Ok(None));

    let mut cache = MockCache::new();
    cache.expect_set().times(0);
    cache
        .expect_delete()
        .withf(|key| key == "user:6")
        .times(1)
        .returning(|_| Ok(()));

    let err = coordinator(records, cache)
        .update(&User::with_id(6).username("gone"))
        .await
        .unwrap_err();

    assert!(matches!(err, CacheError::VanishedAfterWrite { id: 6 }));
}

#[tokio::test]
async fn test_delete_eviction_failure_is_reported() {
    let mut records = MockRecords::new();
    records.expect_delete_by_key().times(1).returning(|_| Ok(1));

    let mut cache = MockCache::new();
    cache
        .expect_delete()
        .times(1)
        .returning(|_| Err(CacheError::Timeout("DEL timed out".to_string())));

    let err = coordinator(records, cache).delete(7).await.unwrap_err();
    assert!(err.is_cache_write_failure());
}

#[tokio::test]
async fn test_cache_outage_keeps_store_authoritative() {
    setup_logging();
    let records = Arc::new(sqlite_store().await);
    let cache = Arc::new(FlakyCache::new());
    let coordinator = CacheCoordinator::new(
        records.clone(),
        cache.clone(),
        cache_config(MissLockMode::Global),
    );

    cache.fail_writes(true);
    let err = coordinator
        .create(&User::with_id(8).username("durable").offset(7))
        .await
        .unwrap_err();
    assert!(err.is_cache_write_failure());

    // 持久化写入已生效，缓存恢复后的读取会从存储回填
    let stored = records.select_by_key(8).await.unwrap().expect("persisted");
    assert_eq!(stored.username.as_deref(), Some("durable"));
    assert!(cache.get("user:8").await.unwrap().is_none());

    cache.fail_writes(false);
    assert_eq!(
        coordinator.read(8).await.unwrap(),
        Lookup::Loaded(stored.clone())
    );
    assert_eq!(coordinator.read(8).await.unwrap(), Lookup::Cached(stored));
}

#[tokio::test]
async fn test_guarded_populate_is_conditional() {
    let mut records = MockRecords::new();
    records
        .expect_select_by_key()
        .with(eq(9))
        .times(1)
        .returning(|id| Ok(Some(User::with_id(id).username("nine"))));

    let mut cache = MockCache::new();
    cache
        .expect_get()
        .withf(|key| key == "user:9")
        .times(2)
        .returning(|_| Ok(None));
    cache
        .expect_set_if_absent_with_ttl()
        .withf(|key, _, ttl_secs| key == "user:9" && *ttl_secs == 7 * 24 * 3600)
        .times(1)
        .returning(|_, _, _| Ok(false));
    cache.expect_set().times(0);
    cache.expect_set_with_ttl().times(0);

    let lookup = coordinator(records, cache).read_guarded(9).await.unwrap();

    assert_eq!(lookup, Lookup::Loaded(User::with_id(9).username("nine")));
}

#[tokio::test]
async fn test_guarded_miss_writes_short_lived_sentinel() {
    let mut records = MockRecords::new();
    records.expect_select_by_key().times(1).returning(|_| Ok(None));

    let mut cache = MockCache::new();
    cache.expect_get().times(2).returning(|_| Ok(None));
    cache
        .expect_set_with_ttl()
        .withf(|key, value, ttl_secs| key == "user:10" && value.is_empty() && *ttl_secs == 60)
        .times(1)
        .returning(|_, _, _| Ok(()));
    cache.expect_set().times(0);
    cache.expect_set_if_absent_with_ttl().times(0);

    let lookup = coordinator(records, cache).read_guarded(10).await.unwrap();

    assert_eq!(lookup, Lookup::NotFound);
}
