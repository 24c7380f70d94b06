//! PostgreSQL persistence for markers.
//!
//! - [`models`]: row structs and create DTOs.
//! - [`repositories`]: zero-sized repositories issuing single statements.
//! - [`backend`]: [`PgMarkerBackend`], the `MarkerBackend` implementation.
//! - [`listener`]: turns `NOTIFY marker_changes` into feed signals.

use sqlx::postgres::PgPoolOptions;

pub mod backend;
pub mod listener;
pub mod models;
pub mod repositories;

pub use backend::PgMarkerBackend;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the bundled schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
