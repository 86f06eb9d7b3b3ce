//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存一致性层的配置结构和解析逻辑。

use crate::activity::window::ActivityWindow;
use crate::error::{CacheError, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;

/// 顶层配置
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub config_version: Option<u32>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
}

/// 未命中回源时的互斥策略
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissLockMode {
    /// 所有键共用一把锁，回源并发度恒为1
    #[default]
    Global,
    /// 按缓存键单飞，不同键的回源互不阻塞
    PerKey,
}

/// 缓存协调器配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct CacheConfig {
    /// 用户缓存键前缀
    pub key_prefix: String,
    /// 负缓存（空值标记）过期时间（秒）
    pub negative_ttl_secs: u64,
    /// 加锁回源后写入缓存的过期时间（秒）
    pub populate_ttl_secs: u64,
    /// 回源互斥策略
    pub miss_lock: MissLockMode,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: "user:".to_string(),
            negative_ttl_secs: 60,
            populate_ttl_secs: 7 * 24 * 3600,
            miss_lock: MissLockMode::Global,
        }
    }
}

/// Redis连接配置（仅支持单机模式）
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct RedisConfig {
    /// 连接字符串
    pub connection_string: SecretString,
    /// 连接超时时间（毫秒）
    pub connection_timeout_ms: u64,
    /// 命令执行超时时间（毫秒）
    pub command_timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            connection_string: SecretString::new("redis://127.0.0.1:6379".to_string().into()),
            connection_timeout_ms: 5000,
            command_timeout_ms: 3000,
        }
    }
}

/// 关系型数据库配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 连接超时时间（秒）
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connect_timeout_secs: 30,
        }
    }
}

/// 每日活跃统计窗口配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ActivityConfig {
    /// 月份前缀，格式为 YYYYMM
    pub month: String,
    /// 窗口天数
    pub days: u32,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            month: "202306".to_string(),
            days: 30,
        }
    }
}

impl Config {
    /// 从TOML字符串解析并验证配置
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(raw).map_err(|e| CacheError::ConfigError(e.to_string()))?;
        config.validate().map_err(CacheError::ConfigError)?;
        Ok(config)
    }

    /// 从TOML文件加载并验证配置
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// 验证配置
    ///
    /// 检查配置的有效性，确保TTL、键前缀、连接参数和统计窗口在合理范围内
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(version) = self.config_version {
            if version > CONFIG_VERSION {
                return Err(format!(
                    "Configuration version {} is not supported. Current version is {}.",
                    version, CONFIG_VERSION
                ));
            }
        }

        if self.cache.key_prefix.is_empty() {
            return Err("cache.key_prefix cannot be empty".to_string());
        }
        if self.cache.negative_ttl_secs == 0 {
            return Err("cache.negative_ttl_secs cannot be zero".to_string());
        }
        if self.cache.populate_ttl_secs == 0 {
            return Err("cache.populate_ttl_secs cannot be zero".to_string());
        }
        if self.cache.negative_ttl_secs > self.cache.populate_ttl_secs {
            return Err(
                "cache.negative_ttl_secs cannot exceed cache.populate_ttl_secs".to_string(),
            );
        }

        if self.redis.command_timeout_ms == 0 || self.redis.connection_timeout_ms == 0 {
            return Err("redis timeouts cannot be zero".to_string());
        }

        if self.database.url.is_empty() {
            return Err("database.url cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("database.max_connections cannot be zero".to_string());
        }

        ActivityWindow::new(&self.activity.month, self.activity.days)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
