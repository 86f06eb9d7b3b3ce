//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 每日活跃统计命令。

use super::{print_json, Backends};
use crate::activity::{ActivityTracker, ActivityWindow, RandomLogins};
use crate::database::RecordStore;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser, Debug)]
pub struct ActivityArgs {
    #[command(subcommand)]
    pub command: ActivitySubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ActivitySubcommand {
    #[command(about = "Randomly record a month of logins for every stored user")]
    Simulate {
        #[arg(long, help = "Seed for a reproducible simulation")]
        seed: Option<u64>,
    },
    #[command(about = "Set or clear one user's login bit for a day")]
    Record {
        #[arg(long)]
        offset: u64,
        #[arg(long)]
        day: u32,
        #[arg(long, help = "Clear the bit instead of setting it")]
        clear: bool,
    },
    #[command(about = "Count users active at least once in the window")]
    Active,
    #[command(about = "Count users active on two consecutive days")]
    Streaks,
}

pub(crate) async fn execute(args: &ActivityArgs, backends: &Backends) -> Result<()> {
    let window = ActivityWindow::new(
        &backends.config.activity.month,
        backends.config.activity.days,
    )?;
    let oracle = match args.command {
        ActivitySubcommand::Simulate { seed: Some(seed) } => RandomLogins::seeded(seed),
        _ => RandomLogins::from_entropy(),
    };
    let tracker =
        ActivityTracker::new(backends.cache.clone(), window).with_oracle(Arc::new(oracle));

    match &args.command {
        ActivitySubcommand::Simulate { .. } => {
            let users = backends.records.select_all().await?;
            let report = tracker.simulate_month(&users).await?;
            print_json(&report)
        }
        ActivitySubcommand::Record { offset, day, clear } => {
            tracker.record_daily_activity(*offset, *day, !*clear).await?;
            println!("Recorded offset {} on day {}: login={}", offset, day, !*clear);
            Ok(())
        }
        ActivitySubcommand::Active => {
            let count = tracker.count_active_users().await?;
            print_json(&serde_json::json!({ "active_users": count }))
        }
        ActivitySubcommand::Streaks => {
            let report = tracker.count_consecutive_two_day_users().await?;
            print_json(&report)
        }
    }
}
