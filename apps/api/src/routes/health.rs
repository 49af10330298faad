use std::time::Duration;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

const DB_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// GET /health
/// Service version plus a `SELECT 1` database check. Always 200 so the
/// process stays in rotation while the database recovers.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let ping = sqlx::query("SELECT 1").execute(&state.db);
    let database = match tokio::time::timeout(DB_CHECK_TIMEOUT, ping).await {
        Ok(Ok(_)) => "ok",
        Ok(Err(e)) => {
            tracing::warn!("Health check database query failed: {e}");
            "unavailable"
        }
        Err(_) => "unavailable",
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": env!("CARGO_PKG_NAME"),
        "database": database
    }))
}
