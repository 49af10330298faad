use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::log_lifecycle::spawn_maintenance;
use crate::parsing::ResumeParser;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{ObjectStore, S3Store};
use crate::telemetry;

pub async fn listen() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;
    telemetry::init_server(&config.rust_log, &config.logs.dir)?;
    config.logs.warn_if_inconsistent();

    info!("Starting resume-api v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    let store: Arc<dyn ObjectStore> = Arc::new(S3Store::from_config(&config.storage).await);
    info!("Object storage initialized (bucket: {})", store.bucket());

    let parser = Arc::new(ResumeParser::from_config(&config.llm)?);
    info!("Resume parsing chain: {}", parser.labels().join(" -> "));

    if spawn_maintenance(config.logs.clone(), store.clone()).is_none() {
        info!("In-process log maintenance disabled; run `resume-api logs run` from cron");
    }

    let state = AppState {
        db,
        store,
        parser,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
