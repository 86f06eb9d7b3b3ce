//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 持久化存储模块
//!
//! 定义记录存储的抽象接口，并提供基于Sea-ORM的用户表实现

use crate::error::Result;
use crate::model::User;
use async_trait::async_trait;

pub mod sea_orm_store;
pub mod user;

pub use sea_orm_store::SeaOrmUserStore;

/// 持久化记录存储
///
/// 缓存一致性层的权威数据源。写操作返回受影响的行数，
/// 由调用方把0行解释为写入失败。
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 插入记录，主键冲突时返回0
    async fn insert(&self, user: &User) -> Result<u64>;

    /// 按主键选择性更新，仅持久化 `Some` 字段
    async fn update_selective(&self, user: &User) -> Result<u64>;

    /// 按主键删除
    async fn delete_by_key(&self, id: i32) -> Result<u64>;

    /// 按主键查询
    async fn select_by_key(&self, id: i32) -> Result<Option<User>>;

    /// 查询全部记录
    async fn select_all(&self) -> Result<Vec<User>>;
}
