//! Database utilities and connection management

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::{str::FromStr, time::Duration};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

/// Delay before the first reconnect attempt at startup
const CONNECT_RETRY_BASE_MS: u64 = 250;
/// Upper bound for a single backoff step
const CONNECT_RETRY_MAX_DELAY: Duration = Duration::from_secs(5);
/// Attempts after the initial connect fails
const CONNECT_MAX_RETRIES: usize = 5;

/// Create a database connection pool
/// Note: Disables statement cache for PgBouncer compatibility
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?.statement_cache_capacity(0);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(60))
        .max_lifetime(Duration::from_secs(300))
        .connect_with(options)
        .await
}

/// Create the pool, retrying with exponential backoff while the database comes up
pub async fn create_pool_with_retry(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    let retry_strategy = ExponentialBackoff::from_millis(CONNECT_RETRY_BASE_MS)
        .max_delay(CONNECT_RETRY_MAX_DELAY)
        .take(CONNECT_MAX_RETRIES)
        .map(jitter);

    Retry::spawn(retry_strategy, || async {
        create_pool(database_url, max_connections)
            .await
            .inspect_err(|e| {
                tracing::warn!(error = %e, "Database connection failed - will retry");
            })
    })
    .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_create_pool_and_migrate() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url, 2).await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .expect("Pool should be usable");
    }
}
