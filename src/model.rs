//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了用户实体，作为持久化存储与缓存之间流转的数据模型。

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 用户实体
///
/// 除主键外所有字段均为可选：`None` 在选择性更新中表示"不修改该列"。
/// `offset` 是用户在每日活跃位图中的位偏移，与 `id` 相互独立。
/// `create_time` 与 `update_time` 由持久化存储生成，调用方提供的值会被忽略。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub sex: Option<i32>,
    #[serde(default)]
    pub deleted: Option<i32>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub create_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub update_time: Option<NaiveDateTime>,
}

impl User {
    /// 仅包含主键的用户，通常作为选择性更新的起点
    pub fn with_id(id: i32) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn sex(mut self, sex: i32) -> Self {
        self.sex = Some(sex);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}
