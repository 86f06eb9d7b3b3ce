//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! `t_user` 表的Sea-ORM实体定义。

use crate::model::User;
use sea_orm::entity::prelude::*;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "t_user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sex: Option<i32>,
    pub deleted: Option<i32>,
    pub offset: Option<i64>,
    pub create_time: Option<DateTime>,
    pub update_time: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            username: model.username,
            password: model.password,
            sex: model.sex,
            deleted: model.deleted,
            offset: model.offset.and_then(|raw| match u64::try_from(raw) {
                Ok(offset) => Some(offset),
                Err(_) => {
                    warn!(
                        "User {} has negative bitmap offset {}, treating as unset",
                        model.id, raw
                    );
                    None
                }
            }),
            create_time: model.create_time,
            update_time: model.update_time,
        }
    }
}
