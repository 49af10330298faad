use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use super::persist::get_resume;
use super::pipeline::{accept_upload, sanitize_filename, spawn_processing, UploadAccepted, UploadedFile};
use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Malformed upload: {}", e.body_text()))
    }
}

/// Pulls the `file` field out of a multipart body. Other fields are ignored.
pub async fn read_file_field(multipart: &mut Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Uploaded file has no filename".to_string()))?;
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(UploadedFile {
            filename,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation(format!("Missing multipart field '{FILE_FIELD}'")))
}

/// POST /upload
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadAccepted>), AppError> {
    let file = read_file_field(&mut multipart).await?;
    let accepted = accept_upload(&state, &file).await?;
    spawn_processing(state, accepted.resume_id, file);
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// GET /resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeRow>, AppError> {
    get_resume(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

/// GET /download/:id
pub async fn handle_download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let resume = get_resume(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    let object = state.store.get(&resume.storage_key).await?;

    let content_type = object
        .content_type
        .or(resume.content_type)
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_filename(&resume.source_filename)
    );

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        object.body,
    ))
}
