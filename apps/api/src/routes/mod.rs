pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::candidates::handlers as candidates;
use crate::ingest::handlers as ingest;
use crate::log_lifecycle::handlers as logs;
use crate::state::AppState;
use crate::ui::handlers as ui;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Ingestion
        .route("/upload", post(ingest::handle_upload))
        .route("/resumes/:id", get(ingest::handle_get_resume))
        .route("/download/:id", get(ingest::handle_download))
        // Candidates
        .route("/candidates", get(candidates::handle_list_candidates))
        .route("/export/excel", get(candidates::handle_export_excel))
        .route(
            "/generate-template/:id",
            get(candidates::handle_generate_template),
        )
        .route("/stats", get(candidates::handle_stats))
        // Browser UI
        .route(
            "/ui/upload",
            get(ui::handle_upload_form).post(ui::handle_upload_submit),
        )
        .route("/ui/candidates", get(ui::handle_candidates_page))
        // Log lifecycle
        .route("/logs/stats", get(logs::handle_local_stats))
        .route("/logs/rotate", post(logs::handle_rotate))
        .route("/logs/cleanup", post(logs::handle_local_cleanup))
        .route("/logs/upload", post(logs::handle_upload))
        .route("/logs/s3/stats", get(logs::handle_remote_stats))
        .route("/logs/s3/list", get(logs::handle_remote_list))
        .route("/logs/s3/cleanup", post(logs::handle_remote_cleanup))
        .route("/logs/run", post(logs::handle_run_cycle))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
