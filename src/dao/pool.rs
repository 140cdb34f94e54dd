use std::str::FromStr;
use std::time::Duration;

use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    config::DatabaseType,
};

/**
 * Creates the connection pool and brings the schema up to date.
 *
 * Connecting is retried a bounded number of times with a fixed delay, so a database that is not yet
 * available at boot does not stop the server. Either a ready pool or the last error is returned
 * before the server starts.
 *
 * # Arguments
 * `db_type`: Database configuration.
 *
 * # Returns
 * A migrated connection pool or an initialization error.
 */
pub async fn connect_with_retry(db_type: &DatabaseType) -> Result<Pool<Sqlite>, ApplicationError> {
    let DatabaseType::Sqlite { connection_string, max_connections, min_connections, acquire_timeout, idle_timeout, max_lifetime, connect_retries, connect_retry_delay } = db_type;
    let connect_options = SqliteConnectOptions::from_str(connection_string)
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Invalid connection string: {err}")))?
        .create_if_missing(true);
    let pool_options = SqlitePoolOptions::new()
        .max_connections(*max_connections)
        .min_connections(*min_connections)
        .acquire_timeout(Duration::from_millis(*acquire_timeout))
        .idle_timeout(Duration::from_millis(*idle_timeout))
        .max_lifetime(Duration::from_millis(*max_lifetime));

    let attempts = (*connect_retries).max(1);
    let mut attempt = 1;
    let pool = loop {
        match pool_options.clone().connect_with(connect_options.clone()).await {
            Ok(pool) => break pool,
            Err(err) if attempt < attempts => {
                tracing::warn!("Database connection attempt {attempt}/{attempts} failed: {err}. Retrying in {connect_retry_delay}ms");
                tokio::time::sleep(Duration::from_millis(*connect_retry_delay)).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!("Database connection failed after {attempts} attempts: {err}");
                return Err(ApplicationError::new(ErrorType::Initialization, format!("Failed to connect to database: {err}")));
            }
        }
    };
    tracing::info!("Connected to the SQLite database");
    run_migrations(&pool).await?;
    Ok(pool)
}

/**
 * Applies the embedded migrations.
 */
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), ApplicationError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to run migrations: {err}")))?;
    tracing::info!("Registrations table ready");
    Ok(())
}

/**
 * Single connection in-memory pool for tests. The connection never expires, so the database lives as
 * long as the pool.
 */
#[cfg(test)]
pub async fn test_pool() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new().max_connections(1).idle_timeout(None).max_lifetime(None).connect("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}
