//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于Redis单机模式的键值缓存后端。

use super::KeyValueStore;
use crate::config::RedisConfig;
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client, FromRedisValue};
use secrecy::ExposeSecret;
use tokio::time::{timeout, Duration};
use tracing::{debug, instrument};

/// Redis键值后端
///
/// 持有一个自动重连的 `ConnectionManager`，每条命令都受 `command_timeout_ms` 约束。
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    manager: ConnectionManager,
    command_timeout_ms: u64,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("command_timeout_ms", &self.command_timeout_ms)
            .finish()
    }
}

impl RedisStore {
    /// 创建新的Redis后端实例
    ///
    /// # 参数
    ///
    /// * `config` - Redis连接配置
    ///
    /// # 返回值
    ///
    /// 返回新的RedisStore实例或错误
    #[instrument(skip(config), level = "info", name = "init_redis_store")]
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.connection_string.expose_secret())?;
        let manager = match timeout(
            Duration::from_millis(config.connection_timeout_ms),
            client.get_connection_manager(),
        )
        .await
        {
            Ok(res) => res?,
            Err(_) => {
                return Err(CacheError::Timeout(format!(
                    "Redis connection timed out after {}ms",
                    config.connection_timeout_ms
                )));
            }
        };
        debug!("Redis store connected");
        Ok(Self {
            client,
            manager,
            command_timeout_ms: config.command_timeout_ms,
        })
    }

    /// 获取命令超时时间（毫秒）
    pub fn command_timeout_ms(&self) -> u64 {
        self.command_timeout_ms
    }

    /// 获取原始Redis客户端
    pub fn raw_client(&self) -> &Client {
        &self.client
    }

    /// 检查连接是否正常
    #[instrument(skip(self), level = "debug")]
    pub async fn ping(&self) -> Result<()> {
        let response: String = self.run(&redis::cmd("PING")).await?;
        debug!("Redis ping response: {}", response);
        Ok(())
    }

    async fn run<T: FromRedisValue + Send>(&self, cmd: &redis::Cmd) -> Result<T> {
        let mut conn = self.manager.clone();
        let pending = async {
            let res: redis::RedisResult<T> = cmd.query_async(&mut conn).await;
            res
        };
        match timeout(Duration::from_millis(self.command_timeout_ms), pending).await {
            Ok(res) => Ok(res?),
            Err(_) => Err(CacheError::Timeout(format!(
                "Redis command timed out after {}ms",
                self.command_timeout_ms
            ))),
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.run(redis::cmd("GET").arg(key)).await
    }

    #[instrument(skip(self, value), level = "debug", fields(value_len = value.len()))]
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.run(redis::cmd("SET").arg(key).arg(value)).await
    }

    #[instrument(skip(self, value), level = "debug", fields(value_len = value.len()))]
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<()> {
        self.run(redis::cmd("SET").arg(key).arg(value).arg("EX").arg(ttl_secs))
            .await
    }

    #[instrument(skip(self, value), level = "debug", fields(value_len = value.len()))]
    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_secs: u64,
    ) -> Result<bool> {
        let result: Option<String> = self
            .run(
                redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("NX")
                    .arg("EX")
                    .arg(ttl_secs),
            )
            .await?;
        debug!("SET NX result for key {}: applied={}", key, result.is_some());
        Ok(result.is_some())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> Result<()> {
        self.run(redis::cmd("DEL").arg(key)).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn set_bit(&self, key: &str, position: u64, value: bool) -> Result<()> {
        let _previous: i64 = self
            .run(
                redis::cmd("SETBIT")
                    .arg(key)
                    .arg(position)
                    .arg(u8::from(value)),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_bits(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.run(redis::cmd("GET").arg(key)).await
    }
}
