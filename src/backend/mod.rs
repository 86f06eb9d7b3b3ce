//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了键值缓存后端的抽象接口及其实现（内存与Redis）。

pub mod memory;
pub mod redis_store;

use crate::error::Result;
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// 位图允许的最大位偏移，与Redis一致（位图最大512MB）
pub const MAX_BIT_OFFSET: u64 = (1 << 32) - 1;

/// 键值缓存后端
///
/// 缓存一致性层与每日活跃统计共用的最小存储接口。
/// 位操作采用Redis `SETBIT` 的布局：位置0是第0个字节的最高位。
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 获取键对应的原始字节，不存在返回None
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// 无过期时间地写入（覆盖已有值及其过期时间）
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// 带过期时间（秒）写入
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<()>;

    /// 仅当键不存在时写入并设置过期时间（秒）
    ///
    /// # 返回值
    ///
    /// 返回是否实际写入
    async fn set_if_absent_with_ttl(&self, key: &str, value: Vec<u8>, ttl_secs: u64)
        -> Result<bool>;

    /// 删除键
    async fn delete(&self, key: &str) -> Result<()>;

    /// 设置或清除位图中指定位置的位，单个位的写入是原子的
    ///
    /// 偏移超过 [`MAX_BIT_OFFSET`] 时返回错误且不修改位图。
    async fn set_bit(&self, key: &str, position: u64, value: bool) -> Result<()>;

    /// 读取完整位图字节
    async fn get_bits(&self, key: &str) -> Result<Option<Vec<u8>>>;
}
