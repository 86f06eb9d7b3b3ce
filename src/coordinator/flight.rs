//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 回源互斥：全局单锁或按键单飞。

use crate::config::MissLockMode;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use tracing::debug;

/// 回源互斥器
///
/// `Global` 模式下所有键的未命中回源排队经过同一把锁，回源并发度恒为1；
/// `PerKey` 模式下只有同一个键的回源互斥。
pub enum MissGuard {
    Global(Mutex<()>),
    PerKey(DashMap<String, Arc<Mutex<()>>>),
}

/// 持有期间独占回源权，析构即释放
pub enum FlightPermit<'a> {
    Global(#[allow(dead_code)] MutexGuard<'a, ()>),
    Key(KeyPermit<'a>),
}

pub struct KeyPermit<'a> {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    flights: &'a DashMap<String, Arc<Mutex<()>>>,
}

impl Drop for KeyPermit<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // 只剩映射表自身持有时才回收，仍有等待者则保留
        self.flights
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl MissGuard {
    pub fn new(mode: MissLockMode) -> Self {
        match mode {
            MissLockMode::Global => MissGuard::Global(Mutex::new(())),
            MissLockMode::PerKey => MissGuard::PerKey(DashMap::new()),
        }
    }

    pub fn mode(&self) -> MissLockMode {
        match self {
            MissGuard::Global(_) => MissLockMode::Global,
            MissGuard::PerKey(_) => MissLockMode::PerKey,
        }
    }

    /// 获取 `key` 的回源权，必要时等待当前持有者释放
    pub async fn acquire(&self, key: &str) -> FlightPermit<'_> {
        match self {
            MissGuard::Global(lock) => {
                let guard = lock.lock().await;
                debug!("Global miss lock acquired for key: {}", key);
                FlightPermit::Global(guard)
            }
            MissGuard::PerKey(flights) => {
                let lock = flights
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .clone();
                let guard = lock.lock_owned().await;
                debug!("Per-key miss lock acquired for key: {}", key);
                FlightPermit::Key(KeyPermit {
                    key: key.to_string(),
                    guard: Some(guard),
                    flights,
                })
            }
        }
    }

    /// 当前登记的按键锁数量，全局模式恒为0
    pub fn in_flight_keys(&self) -> usize {
        match self {
            MissGuard::Global(_) => 0,
            MissGuard::PerKey(flights) => flights.len(),
        }
    }
}
