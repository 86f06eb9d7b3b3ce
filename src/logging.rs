//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了日志订阅器的初始化。

use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅器
///
/// 过滤规则优先使用参数，其次读取 `RUST_LOG`，都没有时默认 `info`。
/// 重复调用是安全的，已有全局订阅器时直接返回。
pub fn init_logging(filter: Option<&str>) {
    let env_filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
