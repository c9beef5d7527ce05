use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;

/// Establishes the connection pool to the PostgreSQL database.
///
/// The pool is the only shared mutable resource in this crate: it caps
/// concurrent connections at `max_connections`, suspends (rather than
/// blocks a thread) any task that acquires while saturated, and fails such
/// a wait after `acquire_timeout_secs` instead of queueing forever.
///
/// On success a one-time connectivity probe confirms the database is
/// actually reachable before the pool is handed to the rest of the
/// application; on failure the full connection target (host, user,
/// database, port — never the password) is logged for the operator.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    let options = PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .password(&settings.password)
        .database(&settings.database);

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .test_before_acquire(settings.keep_alive)
        .connect_with(options)
        .await
        .map_err(|e| connect_failure(settings, e))?;

    // Startup probe: lease one connection and give it straight back. The
    // lazy pool above would otherwise defer a bad password or absent
    // database to the first real request.
    match pool.acquire().await {
        Ok(_lease) => {
            tracing::info!(database = %settings.database, "Database connection established");
        }
        Err(e) => return Err(connect_failure(settings, e)),
    }

    Ok(pool)
}

/// A utility function to run database migrations automatically.
///
/// This is useful for ensuring the database schema is up-to-date when the
/// application starts, which is especially important in production deployments.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    // Use a relative path from the crate root
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Closes every pooled connection. The explicit end of the pool lifecycle;
/// acquires issued after this fail with `DbError::Connection`.
pub async fn close(pool: &PgPool) {
    pool.close().await;
}

fn connect_failure(settings: &DatabaseSettings, e: sqlx::Error) -> DbError {
    tracing::error!(
        host = %settings.host,
        user = %settings.user,
        database = %settings.database,
        port = settings.port,
        error = %e,
        "Could not obtain a database connection"
    );
    DbError::Connection(e)
}
