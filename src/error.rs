//! Typed errors and HTTP mapping.

use crate::schema::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invalid identifier: '{0}'")]
    InvalidId(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::InvalidId(_) => (StatusCode::BAD_REQUEST, "invalid_id"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Db(e) => match e {
                sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "not_found"),
                sqlx::Error::Database(db) => match db.kind() {
                    sqlx::error::ErrorKind::UniqueViolation
                    | sqlx::error::ErrorKind::ForeignKeyViolation
                    | sqlx::error::ErrorKind::CheckViolation
                    | sqlx::error::ErrorKind::NotNullViolation => {
                        (StatusCode::CONFLICT, "constraint_violation")
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
                },
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            },
        };
        let details = match &self {
            AppError::Validation(e) => Some(serde_json::json!({ "field": e.field })),
            AppError::InvalidId(seg) => Some(serde_json::json!({ "segment": seg })),
            _ => None,
        };
        // Statement text stays in debug logs; the body carries the taxonomy only.
        let message = match &self {
            AppError::Db(e) if !matches!(e, sqlx::Error::Database(_)) => {
                tracing::error!(error = %e, "database failure");
                "database failure".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_id_maps_to_400_and_echoes_segment() {
        let resp = AppError::InvalidId("abc".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let resp = AppError::Db(sqlx::Error::RowNotFound).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
