//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 读穿透与负缓存集成测试

#[path = "../common/mod.rs"]
mod common;

use cachecoord::backend::KeyValueStore;
use cachecoord::codec::NEGATIVE_SENTINEL;
use cachecoord::config::MissLockMode;
use cachecoord::database::RecordStore;
use cachecoord::Lookup;
use common::{fixture, memory_fixture, sample_user};
use std::time::Duration;

#[tokio::test]
async fn test_plain_read_loads_then_hits_cache() {
    let fx = fixture(MissLockMode::Global).await;
    fx.records.inner().insert(&sample_user(1)).await.unwrap();

    let first = fx.coordinator.read(1).await.unwrap();
    let stored = fx.records.inner().select_by_key(1).await.unwrap().unwrap();
    assert_eq!(first, Lookup::Loaded(stored.clone()));

    let second = fx.coordinator.read(1).await.unwrap();
    assert_eq!(second, Lookup::Cached(stored));
    assert_eq!(fx.records.select_count(), 1);

    // 普通读回填不带过期时间
    assert!(fx.cache.get("user:1").await.unwrap().is_some());
    assert!(fx.cache.ttl("user:1").is_none());
}

#[tokio::test]
async fn test_plain_read_of_missing_id_hits_store_every_time() {
    let fx = fixture(MissLockMode::Global).await;

    for _ in 0..3 {
        assert_eq!(fx.coordinator.read(42).await.unwrap(), Lookup::NotFound);
    }

    assert_eq!(fx.records.select_count(), 3);
    assert!(fx.cache.get("user:42").await.unwrap().is_none());
}

#[tokio::test]
async fn test_plain_read_reports_negative_entry() {
    let fx = fixture(MissLockMode::Global).await;
    fx.cache
        .set_with_ttl("user:8", NEGATIVE_SENTINEL.to_vec(), 60)
        .await
        .unwrap();

    assert_eq!(
        fx.coordinator.read(8).await.unwrap(),
        Lookup::NegativeCached
    );
    assert_eq!(fx.records.select_count(), 0);
}

#[tokio::test]
async fn test_guarded_read_caches_negative_entry() {
    let fx = fixture(MissLockMode::Global).await;

    assert_eq!(
        fx.coordinator.read_guarded(77).await.unwrap(),
        Lookup::NotFound
    );
    for _ in 0..5 {
        assert_eq!(
            fx.coordinator.read_guarded(77).await.unwrap(),
            Lookup::NegativeCached
        );
    }

    assert_eq!(fx.records.select_count(), 1);
    assert_eq!(
        fx.cache.get("user:77").await.unwrap().as_deref(),
        Some(NEGATIVE_SENTINEL)
    );
    let ttl = fx.cache.ttl("user:77").expect("negative entry expires");
    assert!(ttl <= Duration::from_secs(60));
    assert!(ttl > Duration::from_secs(55));
}

#[tokio::test(start_paused = true)]
async fn test_negative_entry_expires_after_sixty_seconds() {
    let fx = memory_fixture(MissLockMode::Global, Vec::new(), None).await;

    assert_eq!(
        fx.coordinator.read_guarded(9).await.unwrap(),
        Lookup::NotFound
    );
    tokio::time::advance(Duration::from_secs(59)).await;
    assert_eq!(
        fx.coordinator.read_guarded(9).await.unwrap(),
        Lookup::NegativeCached
    );
    assert_eq!(fx.records.select_count(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(
        fx.coordinator.read_guarded(9).await.unwrap(),
        Lookup::NotFound
    );
    assert_eq!(fx.records.select_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_record_created_after_negative_expiry_is_visible() {
    let fx = memory_fixture(MissLockMode::Global, Vec::new(), None).await;

    assert_eq!(
        fx.coordinator.read_guarded(10).await.unwrap(),
        Lookup::NotFound
    );
    // 绕过协调器直接写存储，负缓存在过期前仍然生效
    fx.records.inner().insert(&sample_user(10)).await.unwrap();
    assert_eq!(
        fx.coordinator.read_guarded(10).await.unwrap(),
        Lookup::NegativeCached
    );

    tokio::time::advance(Duration::from_secs(61)).await;
    let lookup = fx.coordinator.read_guarded(10).await.unwrap();
    assert_eq!(lookup, Lookup::Loaded(sample_user(10)));
}

#[tokio::test(start_paused = true)]
async fn test_guarded_populate_uses_seven_day_ttl() {
    let fx = memory_fixture(MissLockMode::PerKey, vec![sample_user(11)], None).await;

    assert_eq!(
        fx.coordinator.read_guarded(11).await.unwrap(),
        Lookup::Loaded(sample_user(11))
    );
    assert_eq!(
        fx.cache.ttl("user:11"),
        Some(Duration::from_secs(7 * 24 * 3600))
    );
    assert_eq!(
        fx.coordinator.read_guarded(11).await.unwrap(),
        Lookup::Cached(sample_user(11))
    );
    assert_eq!(fx.records.select_count(), 1);

    tokio::time::advance(Duration::from_secs(7 * 24 * 3600)).await;
    assert_eq!(
        fx.coordinator.read_guarded(11).await.unwrap(),
        Lookup::Loaded(sample_user(11))
    );
    assert_eq!(fx.records.select_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_guarded_populate_yields_to_concurrent_writer() {
    let fx = memory_fixture(
        MissLockMode::Global,
        vec![sample_user(12)],
        Some(Duration::from_millis(100)),
    )
    .await;
    let newer = sample_user(12).username("newer");
    let newer_bytes = cachecoord::codec::encode_user(&newer).unwrap();

    // 回源查询期间另一写者先回填了缓存
    let competitor = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        fx.cache.set("user:12", newer_bytes.clone()).await.unwrap();
    };
    let (lookup, ()) = tokio::join!(fx.coordinator.read_guarded(12), competitor);

    assert_eq!(lookup.unwrap(), Lookup::Loaded(sample_user(12)));
    assert_eq!(fx.records.select_count(), 1);
    assert_eq!(
        fx.cache.get("user:12").await.unwrap(),
        Some(newer_bytes),
        "populate must not overwrite an entry written during the load"
    );
    assert!(fx.cache.ttl("user:12").is_none());
    assert_eq!(
        fx.coordinator.read_guarded(12).await.unwrap(),
        Lookup::Cached(newer)
    );
}
