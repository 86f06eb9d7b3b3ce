//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 用户增删改查命令。

use super::{print_json, Backends};
use crate::coordinator::CacheCoordinator;
use crate::model::User;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum UserSubcommand {
    #[command(about = "Read a user through the cache")]
    Get {
        #[arg(long)]
        id: i32,
        #[arg(long, help = "Use the stampede-safe read path")]
        guarded: bool,
    },
    #[command(about = "Insert a user and cache the stored record")]
    Create(UserFields),
    #[command(about = "Selectively update a user and refresh the cache")]
    Update(UserFields),
    #[command(about = "Delete a user and evict its cache entry")]
    Delete {
        #[arg(long)]
        id: i32,
    },
}

#[derive(Args, Debug)]
pub struct UserFields {
    #[arg(long)]
    pub id: i32,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub sex: Option<i32>,
    #[arg(long)]
    pub offset: Option<u64>,
}

impl From<&UserFields> for User {
    fn from(fields: &UserFields) -> Self {
        User {
            id: fields.id,
            username: fields.username.clone(),
            password: fields.password.clone(),
            sex: fields.sex,
            offset: fields.offset,
            ..Default::default()
        }
    }
}

pub(crate) async fn execute(args: &UserArgs, backends: &Backends) -> Result<()> {
    let coordinator = CacheCoordinator::new(
        backends.records.clone(),
        backends.cache.clone(),
        backends.config.cache.clone(),
    );

    match &args.command {
        UserSubcommand::Get { id, guarded } => {
            let lookup = if *guarded {
                coordinator.read_guarded(*id).await?
            } else {
                coordinator.read(*id).await?
            };
            print_json(&lookup)
        }
        UserSubcommand::Create(fields) => {
            let user = coordinator.create(&User::from(fields)).await?;
            print_json(&user)
        }
        UserSubcommand::Update(fields) => {
            let user = coordinator.update(&User::from(fields)).await?;
            print_json(&user)
        }
        UserSubcommand::Delete { id } => {
            coordinator.delete(*id).await?;
            println!("User {} deleted", id);
            Ok(())
        }
    }
}
