//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了CLI命令行接口。

use crate::backend::RedisStore;
use crate::config::Config;
use crate::database::SeaOrmUserStore;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

mod activity;
mod user;

pub use activity::{ActivityArgs, ActivitySubcommand};
pub use user::{UserArgs, UserSubcommand};

#[derive(Parser, Debug)]
#[command(name = "cachecoord")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Log filter directives, e.g. 'debug'")]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(name = "user", about = "Cache-consistent user CRUD")]
    User(UserArgs),

    #[command(name = "activity", about = "Daily login bitmaps and analytics")]
    Activity(ActivityArgs),
}

/// 命令执行所需的已连接后端
pub(crate) struct Backends {
    pub config: Config,
    pub records: Arc<SeaOrmUserStore>,
    pub cache: Arc<RedisStore>,
}

impl Backends {
    async fn connect(config: Config) -> Result<Self> {
        let records = SeaOrmUserStore::connect(&config.database)
            .await
            .with_context(|| "Failed to connect to the record store")?;
        records.ensure_schema().await?;
        let cache = RedisStore::connect(&config.redis)
            .await
            .with_context(|| "Failed to connect to Redis")?;
        Ok(Self {
            config,
            records: Arc::new(records),
            cache: Arc::new(cache),
        })
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(Config::default()),
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    crate::logging::init_logging(cli.log.as_deref());

    let config = load_config(cli.config.as_ref())?;
    let backends = Backends::connect(config).await?;

    match &cli.command {
        Commands::User(args) => user::execute(args, &backends).await,
        Commands::Activity(args) => activity::execute(args, &backends).await,
    }
}
