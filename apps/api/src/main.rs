mod candidates;
mod cmd;
mod config;
mod db;
mod errors;
mod extract;
mod ingest;
mod llm_client;
mod log_lifecycle;
mod models;
mod parsing;
mod routes;
mod state;
mod storage;
mod telemetry;
mod ui;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    cmd::run().await
}
