//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存条目的编解码，包括负缓存空值标记。

use crate::error::{CacheError, Result};
use crate::model::User;

/// 负缓存标记：空字符串表示"已确认不存在"
pub const NEGATIVE_SENTINEL: &[u8] = b"";

/// 解码后的缓存条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// 序列化的用户
    Value(User),
    /// 负缓存标记
    Sentinel,
}

/// 将用户序列化为JSON字节数组
pub fn encode_user(user: &User) -> Result<Vec<u8>> {
    serde_json::to_vec(user).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// 解码缓存中的原始字节
///
/// 空字节串视为负缓存标记，其余按JSON反序列化。
pub fn decode_entry(data: &[u8]) -> Result<CacheEntry> {
    if data == NEGATIVE_SENTINEL {
        return Ok(CacheEntry::Sentinel);
    }
    serde_json::from_slice(data)
        .map(CacheEntry::Value)
        .map_err(|e| CacheError::Serialization(e.to_string()))
}
