use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// A working connection could not be obtained: host unreachable, auth
    /// failure, missing database, or the pool's acquire timeout elapsed.
    /// Fatal at the call site; callers must not retry automatically.
    #[error("Failed to connect to the database: {0}")]
    Connection(#[source] sqlx::Error),

    /// The identity insert hit a uniqueness constraint (username or email).
    #[error("An identity with this {field} already exists")]
    DuplicateIdentity { field: String },

    /// Any other failure inside the atomic registration sequence, including
    /// a failed commit. The transaction has been rolled back.
    #[error("Registration could not be completed: {0}")]
    Registration(String),

    #[error("Database query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("The requested data was not found in the database.")]
    NotFound,

    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => DbError::NotFound,
            e @ (sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)) => DbError::Connection(e),
            other => DbError::Query(other),
        }
    }
}

/// Maps a uniqueness violation to `DuplicateIdentity`, carrying the name of
/// the violated constraint for operator logs. Returns `None` for every
/// other error so the caller can apply its own classification.
pub(crate) fn duplicate_identity(e: &sqlx::Error) -> Option<DbError> {
    let db_err = e.as_database_error()?;
    if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) {
        Some(DbError::DuplicateIdentity {
            field: db_err.constraint().unwrap_or("unique constraint").to_string(),
        })
    } else {
        None
    }
}
