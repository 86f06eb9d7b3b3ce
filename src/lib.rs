//! cachecoord - 缓存一致性协调层
//!
//! 在关系型持久化存储与键值缓存之间提供旁路缓存写穿透、
//! 防击穿与防穿透读取，以及基于位图的每日活跃统计。

pub use serde;
pub use tokio;

pub mod activity;
pub mod backend;
pub mod cli;
pub mod codec;
pub mod config;
pub mod coordinator;
pub mod database;
pub mod error;
pub mod logging;
pub mod model;

// Re-export commonly used items
pub use activity::{ActivityTracker, ActivityWindow, StreakReport};
pub use backend::{KeyValueStore, MemoryStore, RedisStore};
pub use config::Config;
pub use coordinator::{CacheCoordinator, Lookup};
pub use database::{RecordStore, SeaOrmUserStore};
pub use error::{CacheError, Result};
pub use model::User;

/// cachecoord 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
