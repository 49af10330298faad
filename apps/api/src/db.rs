use anyhow::Result;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

/// Pool for tests that need a real database; `None` when `DATABASE_URL` is
/// unset so ignored tests run with `--ignored` degrade to a no-op.
#[cfg(test)]
pub async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = create_pool(&url).await.expect("connect to DATABASE_URL");
    run_migrations(&pool).await.expect("apply migrations");
    Some(pool)
}
