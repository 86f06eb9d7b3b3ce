//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 统计窗口：把窗口内的第几天映射为 `YYYYMMDD` 位图键。

use crate::error::{CacheError, Result};
use chrono::{Datelike, NaiveDate};

/// 按月的统计窗口
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityWindow {
    month: String,
    days: u32,
}

impl ActivityWindow {
    /// 创建统计窗口
    ///
    /// # 参数
    ///
    /// * `month` - 6位月份前缀，如 `"202306"`
    /// * `days` - 窗口天数，不能超过该月实际天数
    pub fn new(month: &str, days: u32) -> Result<Self> {
        if month.len() != 6 || !month.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CacheError::ConfigError(format!(
                "activity month '{}' must be six digits (YYYYMM)",
                month
            )));
        }
        let first = NaiveDate::parse_from_str(&format!("{}01", month), "%Y%m%d").map_err(|e| {
            CacheError::ConfigError(format!("activity month '{}' is invalid: {}", month, e))
        })?;
        if days == 0 {
            return Err(CacheError::ConfigError(
                "activity window needs at least one day".to_string(),
            ));
        }
        if NaiveDate::from_ymd_opt(first.year(), first.month(), days).is_none() {
            return Err(CacheError::ConfigError(format!(
                "month {} has fewer than {} days",
                month, days
            )));
        }
        Ok(Self {
            month: month.to_string(),
            days,
        })
    }

    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// 获取第 `day` 天（从1开始）的位图键
    pub fn key_for(&self, day: u32) -> Result<String> {
        if day == 0 || day > self.days {
            return Err(CacheError::OutOfWindow {
                day,
                days: self.days,
            });
        }
        Ok(format!("{}{:02}", self.month, day))
    }

    /// 按时间顺序返回窗口内所有位图键
    pub fn keys(&self) -> Vec<String> {
        (1..=self.days)
            .map(|day| format!("{}{:02}", self.month, day))
            .collect()
    }
}

impl Default for ActivityWindow {
    fn default() -> Self {
        Self {
            month: "202306".to_string(),
            days: 30,
        }
    }
}
