//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 缓存协调器
//!
//! 实现旁路缓存的写穿透（先写持久化存储，成功后再同步缓存）以及两种读路径：
//! 普通读穿透，和带回源互斥与负缓存的防击穿读。

pub mod flight;

use crate::backend::KeyValueStore;
use crate::codec::{decode_entry, encode_user, CacheEntry, NEGATIVE_SENTINEL};
use crate::config::{CacheConfig, MissLockMode};
use crate::database::RecordStore;
use crate::error::{CacheError, Result};
use crate::model::User;
use flight::MissGuard;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 一次读取的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "user", rename_all = "snake_case")]
pub enum Lookup {
    /// 缓存命中
    Cached(User),
    /// 缓存未命中，从持久化存储加载
    Loaded(User),
    /// 命中负缓存标记
    NegativeCached,
    /// 缓存与持久化存储中都不存在
    NotFound,
}

impl Lookup {
    pub fn user(&self) -> Option<&User> {
        match self {
            Lookup::Cached(user) | Lookup::Loaded(user) => Some(user),
            Lookup::NegativeCached | Lookup::NotFound => None,
        }
    }

    pub fn into_user(self) -> Option<User> {
        match self {
            Lookup::Cached(user) | Lookup::Loaded(user) => Some(user),
            Lookup::NegativeCached | Lookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.user().is_some()
    }
}

/// 缓存协调器
///
/// 持久化存储是唯一权威数据源。任何写操作都先完成持久化写入，
/// 写入影响0行时返回 `WriteFailure` 且不触碰缓存；
/// 持久化成功但缓存同步失败时返回 `CacheWriteFailure`。
pub struct CacheCoordinator {
    records: Arc<dyn RecordStore>,
    cache: Arc<dyn KeyValueStore>,
    config: CacheConfig,
    miss_guard: MissGuard,
}

impl CacheCoordinator {
    pub fn new(
        records: Arc<dyn RecordStore>,
        cache: Arc<dyn KeyValueStore>,
        config: CacheConfig,
    ) -> Self {
        let miss_guard = MissGuard::new(config.miss_lock);
        Self {
            records,
            cache,
            config,
            miss_guard,
        }
    }

    /// 当前回源互斥策略
    pub fn miss_lock_mode(&self) -> MissLockMode {
        self.miss_guard.mode()
    }

    /// 用户缓存键，形如 `user:42`
    pub fn cache_key(&self, id: i32) -> String {
        format!("{}{}", self.config.key_prefix, id)
    }

    /// 新增用户
    ///
    /// 插入成功后回查持久化存储，用规范化后的记录覆盖缓存。
    #[instrument(skip(self, user), level = "info", fields(id = user.id))]
    pub async fn create(&self, user: &User) -> Result<User> {
        let rows = self.records.insert(user).await?;
        if rows == 0 {
            warn!("Insert of user {} affected no rows, cache untouched", user.id);
            return Err(CacheError::WriteFailure {
                operation: "insert",
                id: user.id,
            });
        }
        info!("User {} inserted", user.id);
        self.refresh_after_write(user.id).await
    }

    /// 选择性更新用户
    ///
    /// 仅持久化 `Some` 字段，成功后回查并覆盖缓存。
    #[instrument(skip(self, user), level = "info", fields(id = user.id))]
    pub async fn update(&self, user: &User) -> Result<User> {
        let rows = self.records.update_selective(user).await?;
        if rows == 0 {
            warn!("Update of user {} affected no rows, cache untouched", user.id);
            return Err(CacheError::WriteFailure {
                operation: "update",
                id: user.id,
            });
        }
        info!("User {} updated", user.id);
        self.refresh_after_write(user.id).await
    }

    /// 删除用户，成功后删除缓存条目（下一次读取重新加载）
    #[instrument(skip(self), level = "info")]
    pub async fn delete(&self, id: i32) -> Result<()> {
        let rows = self.records.delete_by_key(id).await?;
        if rows == 0 {
            warn!("Delete of user {} affected no rows, cache untouched", id);
            return Err(CacheError::WriteFailure {
                operation: "delete",
                id,
            });
        }
        info!("User {} deleted", id);
        let key = self.cache_key(id);
        self.cache
            .delete(&key)
            .await
            .map_err(|e| cache_write_failure(&key, e))
    }

    /// 普通读穿透
    ///
    /// 命中时原样返回（包括负缓存标记）；未命中时查询持久化存储，
    /// 存在则无过期时间地写回缓存。不存在的记录不会被缓存，
    /// 因此对不存在的键的重复查询每次都会打到持久化存储。
    #[instrument(skip(self), level = "debug")]
    pub async fn read(&self, id: i32) -> Result<Lookup> {
        let key = self.cache_key(id);
        if let Some(hit) = self.lookup_cached(&key).await? {
            return Ok(hit);
        }

        match self.records.select_by_key(id).await? {
            None => {
                warn!("User {} missing from cache and store, miss not cached", id);
                Ok(Lookup::NotFound)
            }
            Some(user) => {
                let bytes = encode_user(&user)?;
                self.cache
                    .set(&key, bytes)
                    .await
                    .map_err(|e| cache_write_failure(&key, e))?;
                debug!("User {} loaded from store and cached", id);
                Ok(Lookup::Loaded(user))
            }
        }
    }

    /// 防击穿读
    ///
    /// 未命中时获取回源锁并二次检查缓存，仍未命中才查询持久化存储。
    /// 记录不存在时写入带短过期时间的负缓存标记；存在时以 SET NX 回写，
    /// 竞争者已写入则不覆盖。锁在所有返回路径上随作用域释放。
    #[instrument(skip(self), level = "debug")]
    pub async fn read_guarded(&self, id: i32) -> Result<Lookup> {
        let key = self.cache_key(id);
        if let Some(hit) = self.lookup_cached(&key).await? {
            return Ok(hit);
        }

        let _permit = self.miss_guard.acquire(&key).await;

        if let Some(hit) = self.lookup_cached(&key).await? {
            debug!("Key {} populated while waiting for the miss lock", key);
            return Ok(hit);
        }

        match self.records.select_by_key(id).await? {
            None => {
                self.cache
                    .set_with_ttl(
                        &key,
                        NEGATIVE_SENTINEL.to_vec(),
                        self.config.negative_ttl_secs,
                    )
                    .await
                    .map_err(|e| cache_write_failure(&key, e))?;
                warn!(
                    "User {} not found, negative entry cached for {}s",
                    id, self.config.negative_ttl_secs
                );
                Ok(Lookup::NotFound)
            }
            Some(user) => {
                let bytes = encode_user(&user)?;
                let applied = self
                    .cache
                    .set_if_absent_with_ttl(&key, bytes, self.config.populate_ttl_secs)
                    .await
                    .map_err(|e| cache_write_failure(&key, e))?;
                debug!("User {} loaded from store, cache populated={}", id, applied);
                Ok(Lookup::Loaded(user))
            }
        }
    }

    async fn lookup_cached(&self, key: &str) -> Result<Option<Lookup>> {
        let Some(bytes) = self.cache.get(key).await? else {
            debug!("Cache miss for key: {}", key);
            return Ok(None);
        };
        match decode_entry(&bytes)? {
            CacheEntry::Value(user) => {
                debug!("Cache hit for key: {}", key);
                Ok(Some(Lookup::Cached(user)))
            }
            CacheEntry::Sentinel => {
                debug!("Negative cache hit for key: {}", key);
                Ok(Some(Lookup::NegativeCached))
            }
        }
    }

    async fn refresh_after_write(&self, id: i32) -> Result<User> {
        let key = self.cache_key(id);
        match self.records.select_by_key(id).await? {
            Some(user) => {
                let bytes = encode_user(&user)?;
                self.cache
                    .set(&key, bytes)
                    .await
                    .map_err(|e| cache_write_failure(&key, e))?;
                Ok(user)
            }
            None => {
                warn!("User {} vanished before re-read, invalidating cache", id);
                self.cache
                    .delete(&key)
                    .await
                    .map_err(|e| cache_write_failure(&key, e))?;
                Err(CacheError::VanishedAfterWrite { id })
            }
        }
    }
}

fn cache_write_failure(key: &str, err: CacheError) -> CacheError {
    warn!("Cache propagation failed for key {}: {}", key, err);
    CacheError::CacheWriteFailure {
        key: key.to_string(),
        reason: err.to_string(),
    }
}
