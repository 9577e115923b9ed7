//! # Storefront DB
//!
//! PostgreSQL pool initialization for the Storefront API, using SQLx.
//!
//! The database is the catalog's source of truth. It is optional: without
//! `DATABASE_URL` the service runs against an in-memory catalog.
//!
//! # Example
//!
//! ```ignore
//! use storefront_db::{database_url_from_env, init_db_pool, run_migrations};
//!
//! if let Some(url) = database_url_from_env() {
//!     let pool = init_db_pool(&url).await?;
//!     run_migrations(&pool).await?;
//! }
//! ```

use sqlx::postgres::PgPoolOptions;
use std::env;
use std::time::Duration;
use tracing::info;

// Re-export PgPool for convenience
pub use sqlx::PgPool;

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads `DATABASE_URL`, treating an empty value as unset.
pub fn database_url_from_env() -> Option<String> {
    env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty())
}

/// Initializes a PostgreSQL connection pool.
///
/// The returned pool is cheaply cloneable and should be passed to the
/// application state for use in request handlers.
///
/// # Errors
///
/// Returns the connection error if the database cannot be reached.
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await?;

    info!(max_connections = MAX_CONNECTIONS, "Database pool ready");
    Ok(pool)
}

/// Applies the catalog schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
