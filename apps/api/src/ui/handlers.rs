use askama::Template;
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::Html,
};
use tracing::info;

use super::views::{CandidateRowView, CandidatesPage, FilterForm, Notice, UploadPage};
use crate::candidates::filters::CandidateFilters;
use crate::candidates::queries::list_candidates;
use crate::errors::AppError;
use crate::ingest::handlers::read_file_field;
use crate::ingest::pipeline::{accept_upload, process_resume, ProcessedResume};
use crate::state::AppState;

fn render(page: impl Template) -> Result<Html<String>, AppError> {
    page.render()
        .map(Html)
        .map_err(|e| AppError::Internal(e.into()))
}

/// GET /ui/upload
pub async fn handle_upload_form() -> Result<Html<String>, AppError> {
    render(UploadPage { notice: None })
}

/// POST /ui/upload
/// Processes the resume before responding so the page can report the outcome.
pub async fn handle_upload_submit(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Html<String>), AppError> {
    let (status, notice) = match ingest_now(&state, &mut multipart).await {
        Ok(processed) => {
            info!(resume_id = %processed.resume_id, "Resume ingested from web form");
            (
                StatusCode::OK,
                Notice::success(format!(
                    "Processed {} with {} (confidence {:.1}).",
                    processed.candidate_name, processed.model, processed.confidence
                )),
            )
        }
        Err(e) => (e.status_and_code().0, Notice::error(e.client_message())),
    };
    Ok((status, render(UploadPage { notice: Some(notice) })?))
}

async fn ingest_now(state: &AppState, multipart: &mut Multipart) -> Result<ProcessedResume, AppError> {
    let file = read_file_field(multipart).await?;
    let accepted = accept_upload(state, &file).await?;
    process_resume(state, accepted.resume_id, file).await
}

/// GET /ui/candidates
pub async fn handle_candidates_page(
    State(state): State<AppState>,
    Query(filters): Query<CandidateFilters>,
) -> Result<(StatusCode, Html<String>), AppError> {
    let form = FilterForm::from(&filters);
    if let Err(e) = filters.validate() {
        let page = CandidatesPage {
            form,
            error: Some(e.client_message()),
            rows: Vec::new(),
        };
        return Ok((StatusCode::BAD_REQUEST, render(page)?));
    }

    let candidates = list_candidates(&state.db, &filters).await?;
    let page = CandidatesPage {
        form,
        error: None,
        rows: candidates.iter().map(CandidateRowView::from).collect(),
    };
    Ok((StatusCode::OK, render(page)?))
}
