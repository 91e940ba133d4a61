use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use plaza_db::DbError;
use plaza_types::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Db(#[from] DbError),

    /// Request rejected by field validation before reaching the store.
    #[error("{0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing or invalid token")]
    Unauthorized,

    #[error("Internal server error")]
    Internal,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    /// Status code and stable machine-readable code for each error kind.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Db(DbError::Validation(_)) | ApiError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            ApiError::Db(DbError::InvalidOperation(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_OPERATION")
            }
            ApiError::Db(DbError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Db(DbError::Forbidden(_)) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            // Only seen once `Database::with_tx` has used up its retries.
            ApiError::Db(DbError::Conflict(_)) => (StatusCode::SERVICE_UNAVAILABLE, "CONFLICT"),
            ApiError::InvalidCredentials | ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
            }
            ApiError::Db(DbError::Sqlite(_) | DbError::LockPoisoned) | ApiError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Store internals are logged, never echoed to the client.
        let message = match &self {
            ApiError::Db(e @ (DbError::Sqlite(_) | DbError::LockPoisoned)) => {
                error!("Database failure: {}", e);
                "Internal server error".to_string()
            }
            ApiError::Db(DbError::Conflict(detail)) => {
                warn!("Write conflict: {}", detail);
                "Conflicting concurrent update, please retry".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_has_a_distinct_signal() {
        let cases = [
            (ApiError::Db(DbError::Validation("x".into())), 400, "VALIDATION_ERROR"),
            (ApiError::Db(DbError::InvalidOperation("x")), 400, "INVALID_OPERATION"),
            (ApiError::Db(DbError::NotFound("post")), 404, "NOT_FOUND"),
            (ApiError::Db(DbError::Forbidden("x")), 403, "FORBIDDEN"),
            (ApiError::Db(DbError::Conflict("x".into())), 503, "CONFLICT"),
            (ApiError::Db(DbError::LockPoisoned), 500, "INTERNAL_ERROR"),
            (ApiError::Unauthorized, 401, "UNAUTHORIZED"),
        ];
        for (err, status, code) in cases {
            let (s, c) = err.status_and_code();
            assert_eq!(s.as_u16(), status);
            assert_eq!(c, code);
        }
    }

    #[tokio::test]
    async fn internal_details_are_not_exposed() {
        let err = ApiError::Db(DbError::Sqlite(plaza_db::rusqlite::Error::InvalidQuery));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "Internal server error");
        assert_eq!(parsed.code, "INTERNAL_ERROR");
    }
}
