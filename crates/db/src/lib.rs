//! Database layer for the hark transcription service.
//!
//! Provides the PostgreSQL pool helpers, the persisted models, the
//! [`store::JobStore`] contract the orchestrator runs against, and the
//! concrete repositories implementing it with conditional updates.

pub mod models;
pub mod repositories;
pub mod store;

pub use store::{JobStore, StoreError};

/// Maximum number of connections held by the shared pool.
const MAX_POOL_CONNECTIONS: u32 = 10;

/// Shared connection pool type used across the workspace.
pub type DbPool = sqlx::PgPool;

/// Create a connection pool against `database_url`.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(MAX_POOL_CONNECTIONS)
        .connect(database_url)
        .await
}

/// Cheap connectivity probe used by the health endpoint and startup checks.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply any pending migrations from the top-level `db/migrations` directory.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
