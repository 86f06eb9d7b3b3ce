//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了进程内的键值缓存后端，语义与Redis子集保持一致。

use super::{KeyValueStore, MAX_BIT_OFFSET};
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument};

#[derive(Clone, Debug)]
struct StoredValue {
    bytes: Vec<u8>,
    expire_at: Option<Instant>,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expire_at, Some(at) if now >= at)
    }
}

/// 内存键值后端
///
/// 每个键的读改写都在 `DashMap` 分片锁内完成，因此 `set_if_absent_with_ttl`
/// 与 `set_bit` 对单个键是原子的。过期时间基于 tokio 时钟，暂停时钟的测试可以直接推进时间。
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取键的剩余生存时间，无过期时间或不存在时返回None
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries.get(key).and_then(|entry| match entry.expire_at {
            Some(at) if at > now => Some(at - now),
            _ => None,
        })
    }

    /// 当前未过期的键数量
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live_bytes(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.bytes.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, v| v.is_expired(now));
            debug!("Memory store: key={} expired, removed", key);
        }
        None
    }

    fn insert(&self, key: &str, bytes: Vec<u8>, ttl_secs: Option<u64>) {
        let expire_at = ttl_secs.map(|secs| Instant::now() + Duration::from_secs(secs));
        self.entries
            .insert(key.to_string(), StoredValue { bytes, expire_at });
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.live_bytes(key))
    }

    #[instrument(skip(self, value), level = "debug", fields(value_len = value.len()))]
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.insert(key, value, None);
        Ok(())
    }

    #[instrument(skip(self, value), level = "debug", fields(value_len = value.len()))]
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<()> {
        self.insert(key, value, Some(ttl_secs));
        Ok(())
    }

    #[instrument(skip(self, value), level = "debug", fields(value_len = value.len()))]
    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_secs: u64,
    ) -> Result<bool> {
        let now = Instant::now();
        let stored = StoredValue {
            bytes: value,
            expire_at: Some(now + Duration::from_secs(ttl_secs)),
        };
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(stored);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(stored);
                Ok(true)
            }
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn set_bit(&self, key: &str, position: u64, value: bool) -> Result<()> {
        if position > MAX_BIT_OFFSET {
            return Err(CacheError::BackendError(format!(
                "bit offset {} is out of range (max {})",
                position, MAX_BIT_OFFSET
            )));
        }
        let now = Instant::now();
        let byte_index = (position / 8) as usize;
        let mask = 0x80u8 >> (position % 8);

        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| StoredValue {
                bytes: Vec::new(),
                expire_at: None,
            });
        if entry.is_expired(now) {
            entry.bytes.clear();
            entry.expire_at = None;
        }
        if entry.bytes.len() <= byte_index {
            entry.bytes.resize(byte_index + 1, 0);
        }
        if value {
            entry.bytes[byte_index] |= mask;
        } else {
            entry.bytes[byte_index] &= !mask;
        }
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_bits(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.live_bytes(key))
    }
}
