//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存一致性层的错误类型和处理机制。

use thiserror::Error;

/// 缓存一致性层错误类型枚举
///
/// 区分持久化写入失败、缓存同步失败和底层驱动错误，
/// 调用方据此决定重试、降级或直接返回错误。
#[derive(Error, Debug)]
pub enum CacheError {
    /// 持久化存储写入影响行数为0，未触发任何缓存写入
    #[error("Write failure: {operation} affected no rows for id {id}")]
    WriteFailure { operation: &'static str, id: i32 },

    /// 持久化写入已成功，但缓存同步失败（存储正确，缓存可能过期）
    #[error("Cache write failure for key {key}: {reason}")]
    CacheWriteFailure { key: String, reason: String },

    /// 写入成功后回查记录时记录已不存在
    #[error("Record {id} vanished between write and re-read")]
    VanishedAfterWrite { id: i32 },

    /// 日期不在统计窗口内
    #[error("Day {day} is outside the activity window 1..={days}")]
    OutOfWindow { day: u32, days: u32 },

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Sea-ORM数据库错误
    #[error("Sea-ORM error: {0}")]
    SeaOrmError(#[from] sea_orm::DbErr),

    /// Redis错误
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    /// IO错误
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// 后端错误
    #[error("Backend error: {0}")]
    BackendError(String),

    /// 超时错误
    #[error("Timeout error: {0}")]
    Timeout(String),
}

impl CacheError {
    /// 是否为持久化写入失败
    pub fn is_write_failure(&self) -> bool {
        matches!(self, CacheError::WriteFailure { .. })
    }

    /// 是否为缓存同步失败
    pub fn is_cache_write_failure(&self) -> bool {
        matches!(self, CacheError::CacheWriteFailure { .. })
    }
}

/// 操作结果类型别名
pub type Result<T> = std::result::Result<T, CacheError>;
