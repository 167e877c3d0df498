use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use qrmenu_order::lifecycle::OrderError;
use qrmenu_order::repository::RepositoryError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}

/// Map repository failures onto HTTP error classes. Transition violations
/// and lost races surface as conflicts so the losing client knows the order
/// moved underneath it; unknown status strings are the caller's fault.
pub fn repo_err(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound(id) => AppError::NotFoundError(format!("Order {} not found", id)),
        e @ RepositoryError::Conflict { .. } => AppError::ConflictError(e.to_string()),
        RepositoryError::Lifecycle(e) => match e {
            OrderError::UnknownStatus(_) | OrderError::UnknownPaymentStatus(_) => {
                AppError::ValidationError(e.to_string())
            }
            OrderError::NotFound(id) => AppError::NotFoundError(format!("Order {} not found", id)),
            other => AppError::ConflictError(other.to_string()),
        },
        e @ RepositoryError::InvoiceCollision(_) => AppError::InternalServerError(e.to_string()),
        RepositoryError::Database(msg) => AppError::InternalServerError(msg),
    }
}
