//! `resume-api logs ...`: the log lifecycle steps as one-shot commands.
//! Needs only log and storage settings, not the database.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;

use crate::config::{LogConfig, StorageConfig};
use crate::log_lifecycle::local::{cleanup_local, local_stats, rotate};
use crate::log_lifecycle::remote::{cleanup_remote, list_remote, remote_stats, upload_archives};
use crate::log_lifecycle::run_cycle;
use crate::storage::{ObjectStore, S3Store};
use crate::telemetry;

#[derive(Subcommand)]
pub enum LogsCommand {
    /// Local log directory statistics
    Stats,
    /// Rotate active log files into timestamped archives
    Rotate,
    /// Delete local archives older than the retention window
    Cleanup {
        #[arg(long)]
        retention_days: Option<u32>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Upload local archives to object storage
    Upload,
    /// Remote log statistics grouped by date
    S3Stats,
    /// Most recent remote log objects
    S3List {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Delete remote log objects older than the retention window
    S3Cleanup {
        #[arg(long)]
        retention_days: Option<u32>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Rotate, clean up locally, upload, clean up remotely
    Run,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn positive(retention_days: Option<u32>, default: u32) -> Result<u32> {
    match retention_days {
        Some(0) => anyhow::bail!("--retention-days must be at least 1"),
        Some(days) => Ok(days),
        None => Ok(default),
    }
}

async fn store() -> Result<Arc<dyn ObjectStore>> {
    let config = StorageConfig::from_env()?;
    Ok(Arc::new(S3Store::from_config(&config).await))
}

pub async fn run(command: LogsCommand) -> Result<()> {
    let logs = LogConfig::from_env()?;
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    telemetry::init_cli(&rust_log)?;
    logs.warn_if_inconsistent();
    let now = Utc::now();

    match command {
        LogsCommand::Stats => {
            let dir = logs.dir.clone();
            print_json(&tokio::task::spawn_blocking(move || local_stats(&dir, now)).await??)
        }
        LogsCommand::Rotate => {
            let dir = logs.dir.clone();
            print_json(&tokio::task::spawn_blocking(move || rotate(&dir, now)).await??)
        }
        LogsCommand::Cleanup {
            retention_days,
            dry_run,
        } => {
            let retention = positive(retention_days, logs.local_retention_days)?;
            let dir = logs.dir.clone();
            let report =
                tokio::task::spawn_blocking(move || cleanup_local(&dir, retention, now, dry_run))
                    .await??;
            print_json(&report)
        }
        LogsCommand::Upload => {
            let store = store().await?;
            let report = upload_archives(logs.dir.clone(), store.as_ref(), &logs.s3_prefix).await?;
            print_json(&report)
        }
        LogsCommand::S3Stats => {
            let store = store().await?;
            print_json(&remote_stats(store.as_ref(), &logs.s3_prefix).await?)
        }
        LogsCommand::S3List { limit } => {
            let store = store().await?;
            print_json(&list_remote(store.as_ref(), &logs.s3_prefix, limit).await?)
        }
        LogsCommand::S3Cleanup {
            retention_days,
            dry_run,
        } => {
            let retention = positive(retention_days, logs.remote_retention_days)?;
            let store = store().await?;
            let report =
                cleanup_remote(store.as_ref(), &logs.s3_prefix, retention, now, dry_run).await?;
            print_json(&report)
        }
        LogsCommand::Run => {
            let store = store().await?;
            let report = run_cycle(&logs, store.as_ref(), now).await;
            print_json(&report)
        }
    }
}
