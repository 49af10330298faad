use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::cycle::{run_cycle, CycleReport};
use super::local::{cleanup_local, local_stats, rotate, LocalStats, RotationReport};
use super::remote::{cleanup_remote, list_remote, remote_stats, upload_archives, RemoteStats, UploadReport};
use super::{CleanupReport, LifecycleError};
use crate::errors::AppError;
use crate::state::AppState;
use crate::storage::ObjectInfo;

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    pub retention_days: Option<u32>,
    #[serde(default)]
    pub dry_run: bool,
}

impl CleanupParams {
    fn retention(&self, default: u32) -> Result<u32, AppError> {
        match self.retention_days {
            Some(0) => Err(AppError::Validation(
                "retention_days must be at least 1".to_string(),
            )),
            Some(days) => Ok(days),
            None => Ok(default),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, LifecycleError> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(LifecycleError::from)?;
    Ok(result?)
}

/// GET /logs/stats
pub async fn handle_local_stats(State(state): State<AppState>) -> Result<Json<LocalStats>, AppError> {
    let dir = state.config.logs.dir.clone();
    Ok(Json(blocking(move || local_stats(&dir, Utc::now())).await?))
}

/// POST /logs/rotate
pub async fn handle_rotate(State(state): State<AppState>) -> Result<Json<RotationReport>, AppError> {
    let dir = state.config.logs.dir.clone();
    Ok(Json(blocking(move || rotate(&dir, Utc::now())).await?))
}

/// POST /logs/cleanup?retention_days=&dry_run=
pub async fn handle_local_cleanup(
    State(state): State<AppState>,
    Query(params): Query<CleanupParams>,
) -> Result<Json<CleanupReport>, AppError> {
    let retention = params.retention(state.config.logs.local_retention_days)?;
    let dir = state.config.logs.dir.clone();
    let dry_run = params.dry_run;
    Ok(Json(
        blocking(move || cleanup_local(&dir, retention, Utc::now(), dry_run)).await?,
    ))
}

/// POST /logs/upload
pub async fn handle_upload(State(state): State<AppState>) -> Result<Json<UploadReport>, AppError> {
    let logs = &state.config.logs;
    let report = upload_archives(logs.dir.clone(), state.store.as_ref(), &logs.s3_prefix).await?;
    Ok(Json(report))
}

/// GET /logs/s3/stats
pub async fn handle_remote_stats(State(state): State<AppState>) -> Result<Json<RemoteStats>, AppError> {
    let stats = remote_stats(state.store.as_ref(), &state.config.logs.s3_prefix).await?;
    Ok(Json(stats))
}

/// GET /logs/s3/list?limit=
pub async fn handle_remote_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ObjectInfo>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    let objects = list_remote(state.store.as_ref(), &state.config.logs.s3_prefix, limit).await?;
    Ok(Json(objects))
}

/// POST /logs/s3/cleanup?retention_days=&dry_run=
pub async fn handle_remote_cleanup(
    State(state): State<AppState>,
    Query(params): Query<CleanupParams>,
) -> Result<Json<CleanupReport>, AppError> {
    let logs = &state.config.logs;
    let retention = params.retention(logs.remote_retention_days)?;
    let report = cleanup_remote(
        state.store.as_ref(),
        &logs.s3_prefix,
        retention,
        Utc::now(),
        params.dry_run,
    )
    .await?;
    Ok(Json(report))
}

/// POST /logs/run
pub async fn handle_run_cycle(State(state): State<AppState>) -> Json<CycleReport> {
    Json(run_cycle(&state.config.logs, state.store.as_ref(), Utc::now()).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_params_default_and_zero() {
        let params = CleanupParams {
            retention_days: None,
            dry_run: false,
        };
        assert_eq!(params.retention(30).unwrap(), 30);

        let params = CleanupParams {
            retention_days: Some(0),
            dry_run: true,
        };
        assert!(params.retention(30).is_err());
    }
}
