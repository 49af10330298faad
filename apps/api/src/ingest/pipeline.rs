//! Upload intake and the extract → parse → persist pipeline.

use anyhow::anyhow;
use bytes::Bytes;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::persist;
use crate::errors::AppError;
use crate::extract::extract_text;
use crate::models::resume::{NewResume, ProcessingStatus};
use crate::parsing::ParseOutcome;
use crate::state::AppState;
use crate::storage::storage_url;

const MAX_FILENAME_CHARS: usize = 120;

/// A file as received from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadAccepted {
    pub resume_id: Uuid,
    pub storage_url: String,
    pub status: ProcessingStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedResume {
    pub resume_id: Uuid,
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub model: String,
    pub confidence: f64,
}

/// Reduces a client-supplied name to its final path component made of
/// `[A-Za-z0-9._-]`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_CHARS)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.trim_matches('_').is_empty() {
        "resume".to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn resume_storage_key(resume_id: Uuid, filename: &str) -> String {
    format!("resumes/{resume_id}/{}", sanitize_filename(filename))
}

/// Stores the original file and records a `pending` resume row.
pub async fn accept_upload(state: &AppState, file: &UploadedFile) -> Result<UploadAccepted, AppError> {
    if file.bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    let resume_id = Uuid::new_v4();
    let key = resume_storage_key(resume_id, &file.filename);
    let content_type = file
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());

    state
        .store
        .put(&key, file.bytes.to_vec(), &content_type)
        .await?;

    let row = persist::insert_resume(
        &state.db,
        &NewResume {
            id: resume_id,
            source_filename: file.filename.clone(),
            storage_key: key.clone(),
            content_type: file.content_type.clone(),
            size_bytes: file.bytes.len() as i64,
        },
    )
    .await?;

    info!(resume_id = %row.id, key = %key, size = file.bytes.len(), "Resume stored");
    Ok(UploadAccepted {
        resume_id,
        storage_url: storage_url(state.store.bucket(), &key),
        status: ProcessingStatus::Pending,
    })
}

/// Runs the pipeline for an accepted upload. Any failure marks the resume
/// `failed` with the error message before it is returned.
pub async fn process_resume(
    state: &AppState,
    resume_id: Uuid,
    file: UploadedFile,
) -> Result<ProcessedResume, AppError> {
    match run_pipeline(state, resume_id, file).await {
        Ok(processed) => Ok(processed),
        Err(e) => {
            warn!(resume_id = %resume_id, "Resume processing failed: {e}");
            if let Err(db_err) = persist::mark_failed(&state.db, resume_id, &e.to_string()).await {
                error!(resume_id = %resume_id, "Could not mark resume as failed: {db_err}");
            }
            Err(e)
        }
    }
}

async fn run_pipeline(
    state: &AppState,
    resume_id: Uuid,
    file: UploadedFile,
) -> Result<ProcessedResume, AppError> {
    persist::set_status(&state.db, resume_id, ProcessingStatus::Processing).await?;

    let text = tokio::task::spawn_blocking(move || {
        extract_text(&file.bytes, file.content_type.as_deref(), &file.filename)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow!("text extraction task failed: {e}")))??;

    let outcome: ParseOutcome = state.parser.parse_resume(&text).await?;
    let candidate_id = persist::persist_parsed(&state.db, resume_id, &outcome).await?;

    info!(
        resume_id = %resume_id,
        candidate_id = %candidate_id,
        model = %outcome.model,
        attempts = outcome.attempts,
        "Resume processed"
    );
    Ok(ProcessedResume {
        resume_id,
        candidate_id,
        candidate_name: outcome.resume.name().unwrap_or_default().to_string(),
        model: outcome.model,
        confidence: outcome.confidence,
    })
}

/// Fire-and-forget processing for the API upload path.
pub fn spawn_processing(state: AppState, resume_id: Uuid, file: UploadedFile) {
    tokio::spawn(async move {
        // Errors are already logged and recorded on the resume row.
        let _ = process_resume(&state, resume_id, file).await;
    });
}
