use anyhow::anyhow;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::export::{build_workbook, export_filename, XLSX_CONTENT_TYPE};
use super::filters::CandidateFilters;
use super::profile::{profile_filename, profile_key, render_profile, TemplateStyle, PROFILE_CONTENT_TYPE};
use super::queries::{get_candidate, list_candidates, service_stats, ServiceStats};
use crate::errors::AppError;
use crate::models::candidate::CandidateListing;
use crate::state::AppState;
use crate::storage::storage_url;

#[derive(Serialize)]
pub struct CandidateListResponse {
    pub total: usize,
    pub candidates: Vec<CandidateListing>,
}

/// GET /candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Query(filters): Query<CandidateFilters>,
) -> Result<Json<CandidateListResponse>, AppError> {
    filters.validate()?;
    let candidates = list_candidates(&state.db, &filters).await?;
    Ok(Json(CandidateListResponse {
        total: candidates.len(),
        candidates,
    }))
}

/// GET /export/excel
pub async fn handle_export_excel(
    State(state): State<AppState>,
    Query(filters): Query<CandidateFilters>,
) -> Result<impl IntoResponse, AppError> {
    filters.validate()?;
    let candidates = list_candidates(&state.db, &filters).await?;
    let now = Utc::now();
    let count = candidates.len();
    let filtered = !filters.is_empty();

    let bytes = tokio::task::spawn_blocking(move || build_workbook(&candidates, &filters, now))
        .await
        .map_err(|e| anyhow!("export task failed: {e}"))??;

    let filename = export_filename(now);
    info!(candidates = count, filtered, %filename, "Excel export generated");
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}

#[derive(Deserialize)]
pub struct TemplateQuery {
    pub template: Option<String>,
}

impl TemplateQuery {
    fn style(&self) -> Result<TemplateStyle, AppError> {
        self.template
            .as_deref()
            .map_or(Ok(TemplateStyle::default()), |t| t.parse::<TemplateStyle>())
            .map_err(AppError::Validation)
    }
}

#[derive(Serialize)]
pub struct GeneratedProfile {
    pub success: bool,
    pub file_url: String,
    pub filename: String,
    pub candidate_name: String,
}

/// GET /generate-template/:id
pub async fn handle_generate_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<TemplateQuery>,
) -> Result<Json<GeneratedProfile>, AppError> {
    let style = query.style()?;
    let listing = get_candidate(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;

    let now = Utc::now();
    let document = render_profile(&listing, style, now);
    let filename = profile_filename(&listing.candidate.full_name, now);
    let key = profile_key(&filename);
    state
        .store
        .put(&key, document.into_bytes(), PROFILE_CONTENT_TYPE)
        .await?;

    info!(candidate_id = %id, %key, "Candidate profile generated");
    Ok(Json(GeneratedProfile {
        success: true,
        file_url: storage_url(state.store.bucket(), &key),
        filename,
        candidate_name: listing.candidate.full_name,
    }))
}

/// GET /stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<ServiceStats>, AppError> {
    Ok(Json(service_stats(&state.db).await?))
}
