//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于Sea-ORM的用户记录存储实现。

use super::{user, RecordStore};
use crate::config::DatabaseConfig;
use crate::error::{CacheError, Result};
use crate::model::User;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Schema,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Sea-ORM用户存储
///
/// `create_time` 和 `update_time` 由本存储在写入时生成。
#[derive(Clone)]
pub struct SeaOrmUserStore {
    connection: Arc<DatabaseConnection>,
}

impl std::fmt::Debug for SeaOrmUserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeaOrmUserStore")
            .field("backend", &self.connection.get_database_backend())
            .finish()
    }
}

fn offset_column(offset: Option<u64>) -> Result<Option<i64>> {
    offset
        .map(|o| {
            i64::try_from(o)
                .map_err(|_| CacheError::BackendError(format!("offset {} out of range", o)))
        })
        .transpose()
}

impl SeaOrmUserStore {
    /// 根据配置建立数据库连接
    ///
    /// 内存SQLite每个连接都是独立的数据库，此时应将 `max_connections` 设为1。
    #[instrument(skip(config), level = "info", name = "init_record_store")]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut opt = ConnectOptions::new(config.url.clone());
        opt.max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .sqlx_logging(false);

        let connection = Database::connect(opt).await?;
        info!(
            "Record store connected: backend={:?}",
            connection.get_database_backend()
        );
        Ok(Self::from_connection(connection))
    }

    pub fn from_connection(connection: DatabaseConnection) -> Self {
        Self {
            connection: Arc::new(connection),
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// 如果 `t_user` 表不存在则根据实体定义创建
    #[instrument(skip(self), level = "info")]
    pub async fn ensure_schema(&self) -> Result<()> {
        let backend = self.connection.get_database_backend();
        let schema = Schema::new(backend);
        let mut stmt = schema.create_table_from_entity(user::Entity);
        stmt.if_not_exists();
        self.connection.execute(backend.build(&stmt)).await?;
        debug!("Schema ensured for table t_user");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SeaOrmUserStore {
    #[instrument(skip(self, record), level = "debug", fields(id = record.id))]
    async fn insert(&self, record: &User) -> Result<u64> {
        let now = Utc::now().naive_utc();
        let model = user::ActiveModel {
            id: Set(record.id),
            username: Set(record.username.clone()),
            password: Set(record.password.clone()),
            sex: Set(record.sex),
            deleted: Set(Some(record.deleted.unwrap_or(0))),
            offset: Set(offset_column(record.offset)?),
            create_time: Set(Some(now)),
            update_time: Set(Some(now)),
        };

        let rows = user::Entity::insert(model)
            .on_conflict(
                OnConflict::column(user::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.connection.as_ref())
            .await?;
        debug!("Insert affected {} rows", rows);
        Ok(rows)
    }

    #[instrument(skip(self, record), level = "debug", fields(id = record.id))]
    async fn update_selective(&self, record: &User) -> Result<u64> {
        let mut model = user::ActiveModel {
            update_time: Set(Some(Utc::now().naive_utc())),
            ..Default::default()
        };
        if let Some(username) = &record.username {
            model.username = Set(Some(username.clone()));
        }
        if let Some(password) = &record.password {
            model.password = Set(Some(password.clone()));
        }
        if let Some(sex) = record.sex {
            model.sex = Set(Some(sex));
        }
        if let Some(deleted) = record.deleted {
            model.deleted = Set(Some(deleted));
        }
        if record.offset.is_some() {
            model.offset = Set(offset_column(record.offset)?);
        }

        let result = user::Entity::update_many()
            .set(model)
            .filter(user::Column::Id.eq(record.id))
            .exec(self.connection.as_ref())
            .await?;
        debug!("Update affected {} rows", result.rows_affected);
        Ok(result.rows_affected)
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_by_key(&self, id: i32) -> Result<u64> {
        let result = user::Entity::delete_by_id(id)
            .exec(self.connection.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    #[instrument(skip(self), level = "debug")]
    async fn select_by_key(&self, id: i32) -> Result<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(self.connection.as_ref())
            .await?;
        Ok(model.map(User::from))
    }

    #[instrument(skip(self), level = "debug")]
    async fn select_all(&self) -> Result<Vec<User>> {
        let models = user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(self.connection.as_ref())
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }
}
