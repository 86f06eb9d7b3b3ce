//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 每日活跃统计模块
//!
//! 以日期为键、用户偏移为位置，在键值缓存中用位图记录每个用户每天是否登录，
//! 并基于位运算统计月活跃人数与连续两天登录人数。

pub mod bitmap;
pub mod oracle;
pub mod window;

use crate::backend::KeyValueStore;
use crate::error::Result;
use crate::model::User;
use futures::future::try_join_all;
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub use bitmap::Bitmap;
pub use oracle::{LoginOracle, RandomLogins};
pub use window::ActivityWindow;

/// 模拟写入时的并发度
const SIMULATION_CONCURRENCY: usize = 32;

/// 一次月度模拟的结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    /// 参与模拟的用户数
    pub users: usize,
    /// 因缺少偏移而跳过的用户数
    pub skipped: usize,
    /// 记录为已登录的用户·天数
    pub logins: usize,
}

/// 连续两天登录统计
///
/// 同一用户在多个相邻日期对上都满足条件时，每一对都计一次，不去重。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreakReport {
    pub count: u64,
    /// 按 `偏移 + 1` 报告的用户标识，按日期对、再按偏移排序
    pub user_ids: Vec<u64>,
}

/// 每日活跃统计器
///
/// 只依赖键值缓存，与缓存协调器相互独立。
pub struct ActivityTracker {
    store: Arc<dyn KeyValueStore>,
    window: ActivityWindow,
    oracle: Arc<dyn LoginOracle>,
}

impl ActivityTracker {
    /// 创建统计器，默认使用系统熵驱动的随机登录来源
    pub fn new(store: Arc<dyn KeyValueStore>, window: ActivityWindow) -> Self {
        Self {
            store,
            window,
            oracle: Arc::new(RandomLogins::from_entropy()),
        }
    }

    /// 替换登录来源
    pub fn with_oracle(mut self, oracle: Arc<dyn LoginOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn window(&self) -> &ActivityWindow {
        &self.window
    }

    /// 记录用户某天的登录状态
    ///
    /// # 参数
    ///
    /// * `user_offset` - 用户在位图中的偏移
    /// * `day` - 窗口内第几天（从1开始）
    /// * `did_login` - 是否登录，`false` 会清除对应位
    #[instrument(skip(self), level = "debug")]
    pub async fn record_daily_activity(
        &self,
        user_offset: u64,
        day: u32,
        did_login: bool,
    ) -> Result<()> {
        let key = self.window.key_for(day)?;
        self.store.set_bit(&key, user_offset, did_login).await
    }

    /// 为每个用户模拟整个窗口的登录情况
    ///
    /// 所有登录决策先按用户、日期顺序从登录来源取出，再并发写入，
    /// 因此固定种子的来源得到的位图是确定的。
    #[instrument(skip(self, users), level = "info", fields(user_count = users.len()))]
    pub async fn simulate_month(&self, users: &[User]) -> Result<SimulationReport> {
        let mut report = SimulationReport::default();
        let mut plan = Vec::with_capacity(users.len() * self.window.days() as usize);

        for user in users {
            let Some(offset) = user.offset else {
                warn!("User {} has no offset, skipping simulation", user.id);
                report.skipped += 1;
                continue;
            };
            report.users += 1;
            for day in 1..=self.window.days() {
                let login = self.oracle.did_login(user, day);
                if login {
                    report.logins += 1;
                    debug!(
                        "User {} logged in on {}{:02}",
                        user.id,
                        self.window.month(),
                        day
                    );
                }
                plan.push((offset, day, login));
            }
        }

        futures::stream::iter(plan)
            .map(|(offset, day, login)| self.record_daily_activity(offset, day, login))
            .buffer_unordered(SIMULATION_CONCURRENCY)
            .try_collect::<Vec<()>>()
            .await?;

        info!(
            "Simulated {} users over {} days: {} logins, {} skipped",
            report.users,
            self.window.days(),
            report.logins,
            report.skipped
        );
        Ok(report)
    }

    /// 统计窗口内至少登录过一次的用户数
    ///
    /// 对所有日期的位图求或后计数，缺失的位图视为全0。
    #[instrument(skip(self), level = "info")]
    pub async fn count_active_users(&self) -> Result<u64> {
        let mut active = Bitmap::new();
        for day in self.load_window().await? {
            active.or_assign(&day);
        }
        let count = active.count_ones();
        info!(
            "There are {} users who logged in during {}",
            count,
            self.window.month()
        );
        Ok(count)
    }

    /// 统计连续两天都登录的用户
    ///
    /// 对每一对相邻日期的位图求与并累加。报告的标识为 `偏移 + 1`，
    /// 该换算假设偏移等于标识减一，尚未与真实的偏移-标识映射核对。
    #[instrument(skip(self), level = "info")]
    pub async fn count_consecutive_two_day_users(&self) -> Result<StreakReport> {
        let days = self.load_window().await?;
        let mut report = StreakReport::default();

        for pair in days.windows(2) {
            let both = pair[0].and(&pair[1]);
            let count = both.count_ones();
            if count == 0 {
                continue;
            }
            report.count += count;
            report.user_ids.extend(both.iter_ones().map(|offset| offset + 1));
        }

        info!(
            "There are {} users who logged in continuously for two days in {}: {:?}",
            report.count,
            self.window.month(),
            report.user_ids
        );
        Ok(report)
    }

    async fn load_window(&self) -> Result<Vec<Bitmap>> {
        let keys = self.window.keys();
        let loads = keys.iter().map(|key| self.store.get_bits(key));
        let raw = try_join_all(loads).await?;
        Ok(raw
            .into_iter()
            .map(|bytes| bytes.map(Bitmap::from_bytes).unwrap_or_default())
            .collect())
    }
}
