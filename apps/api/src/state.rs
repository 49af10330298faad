use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::parsing::ResumeParser;
use crate::storage::ObjectStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Resume files, generated profiles and log archives.
    pub store: Arc<dyn ObjectStore>,
    pub parser: Arc<ResumeParser>,
    pub config: Config,
}
