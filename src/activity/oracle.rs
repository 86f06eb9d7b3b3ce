//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 模拟登录时的随机来源。

use crate::model::User;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// 决定某个用户在某天是否登录
pub trait LoginOracle: Send + Sync {
    fn did_login(&self, user: &User, day: u32) -> bool;
}

impl<F> LoginOracle for F
where
    F: Fn(&User, u32) -> bool + Send + Sync,
{
    fn did_login(&self, user: &User, day: u32) -> bool {
        self(user, day)
    }
}

/// 以给定概率掷硬币的随机登录来源
pub struct RandomLogins {
    rng: Mutex<StdRng>,
    probability: f64,
}

impl RandomLogins {
    /// 以系统熵初始化，每次运行结果不同
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            probability: 0.5,
        }
    }

    /// 以固定种子初始化，相同种子产生相同的登录序列
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            probability: 0.5,
        }
    }

    /// 设置登录概率，取值会被限制在 `[0, 1]`，NaN 按默认的 0.5 处理
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = if probability.is_nan() {
            0.5
        } else {
            probability.clamp(0.0, 1.0)
        };
        self
    }
}

impl Default for RandomLogins {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl LoginOracle for RandomLogins {
    fn did_login(&self, _user: &User, _day: u32) -> bool {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_bool(self.probability)
    }
}
