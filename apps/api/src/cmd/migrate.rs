use anyhow::Result;

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::telemetry;

pub async fn apply() -> Result<()> {
    let config = Config::from_env()?;
    telemetry::init_cli(&config.rust_log)?;
    config.logs.warn_if_inconsistent();

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    println!("Migrations applied successfully");
    Ok(())
}
