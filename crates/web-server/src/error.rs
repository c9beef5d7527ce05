use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use database::DbError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Converts our custom `AppError` into an HTTP response.
///
/// The body is always the `{success: false, error}` envelope with a
/// sanitized message; the underlying cause goes to the operator log only.
/// Raw driver errors never reach a client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(DbError::NotFound) => (
                StatusCode::NOT_FOUND,
                "The requested record was not found".to_string(),
            ),
            AppError::Database(DbError::DuplicateIdentity { field }) => {
                tracing::error!(constraint = %field, "Rejected duplicate identity registration.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An account with these details already exists".to_string(),
                )
            }
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };

        let body = Json(json!({ "success": false, "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn envelope_of(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_records_map_to_404_with_the_failure_envelope() {
        let (status, body) = envelope_of(AppError::NotFound("Doctor not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Doctor not found");
    }

    #[tokio::test]
    async fn duplicate_identities_never_leak_the_constraint_name() {
        let (status, body) = envelope_of(AppError::Database(DbError::DuplicateIdentity {
            field: "users_email_key".to_string(),
        }))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(!body["error"].as_str().unwrap().contains("users_email_key"));
    }
}
