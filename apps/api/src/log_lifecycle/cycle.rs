use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use super::local::{cleanup_local, rotate, RotationReport};
use super::remote::{cleanup_remote, upload_archives, UploadReport};
use super::{CleanupReport, LifecycleError};
use crate::config::LogConfig;
use crate::storage::ObjectStore;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome<T> {
    Completed { report: T },
    Failed { error: String },
}

impl<T> StepOutcome<T> {
    fn from_result(step: &str, result: Result<T, LifecycleError>) -> Self {
        match result {
            Ok(report) => StepOutcome::Completed { report },
            Err(e) => {
                error!("Log lifecycle step '{step}' failed: {e}");
                StepOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub rotation: StepOutcome<RotationReport>,
    pub local_cleanup: StepOutcome<CleanupReport>,
    pub upload: StepOutcome<UploadReport>,
    pub remote_cleanup: StepOutcome<CleanupReport>,
}

/// Rotate, sweep local archives, upload what remains, sweep the remote tier.
/// A failing step is recorded and the later steps still run.
pub async fn run_cycle(
    config: &LogConfig,
    store: &dyn ObjectStore,
    now: DateTime<Utc>,
) -> CycleReport {
    info!(dir = %config.dir.display(), "Starting log lifecycle cycle");

    let dir = config.dir.clone();
    let rotation = tokio::task::spawn_blocking(move || rotate(&dir, now))
        .await
        .map_err(LifecycleError::from)
        .and_then(|r| r);
    let rotation = StepOutcome::from_result("rotate", rotation);

    let dir = config.dir.clone();
    let retention = config.local_retention_days;
    let local_cleanup =
        tokio::task::spawn_blocking(move || cleanup_local(&dir, retention, now, false))
            .await
            .map_err(LifecycleError::from)
            .and_then(|r| r);
    let local_cleanup = StepOutcome::from_result("local cleanup", local_cleanup);

    let upload = upload_archives(config.dir.clone(), store, &config.s3_prefix).await;
    let upload = StepOutcome::from_result("upload", upload);

    let remote_cleanup = cleanup_remote(
        store,
        &config.s3_prefix,
        config.remote_retention_days,
        now,
        false,
    )
    .await;
    let remote_cleanup = StepOutcome::from_result("remote cleanup", remote_cleanup);

    let failed_steps = [
        rotation.is_completed(),
        local_cleanup.is_completed(),
        upload.is_completed(),
        remote_cleanup.is_completed(),
    ]
    .into_iter()
    .filter(|completed| !completed)
    .count();
    info!(failed_steps, "Log lifecycle cycle finished");
    CycleReport {
        started_at: now,
        rotation,
        local_cleanup,
        upload,
        remote_cleanup,
    }
}

/// Runs `run_cycle` every `config.maintenance_interval_secs` seconds in the
/// background. Returns `None` when the interval is 0.
pub fn spawn_maintenance(
    config: LogConfig,
    store: Arc<dyn ObjectStore>,
) -> Option<tokio::task::JoinHandle<()>> {
    if config.maintenance_interval_secs == 0 {
        return None;
    }
    let period = Duration::from_secs(config.maintenance_interval_secs);
    info!("Log maintenance scheduled every {}s", period.as_secs());

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            run_cycle(&config, store.as_ref(), Utc::now()).await;
        }
    }))
}
