use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::responses::JsonResponse;
use crate::services::reconciler::ReconcileError;
use crate::services::stripe::StripeServiceError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Auth(String),
    #[error(transparent)]
    Provider(#[from] StripeServiceError),
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Persistence(e) => AppError::Persistence(e),
            ReconcileError::Serialization(e) => AppError::Serialization(e),
            ReconcileError::NoMatchingOrganization(_) => AppError::Persistence(sqlx::Error::RowNotFound),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => JsonResponse::unprocessable(&msg).into_response(),
            AppError::Conflict(msg) => JsonResponse::forbidden(&msg).into_response(),
            AppError::NotFound => StatusCode::NOT_FOUND.into_response(),
            AppError::Auth(msg) => JsonResponse::bad_request(&msg).into_response(),
            AppError::Provider(err) => match err {
                StripeServiceError::InvalidRequest(msg) | StripeServiceError::NotFound(msg) => {
                    JsonResponse::provider_rejected(&msg).into_response()
                }
                other => {
                    error!(?other, "billing provider call failed");
                    JsonResponse::server_error(&other.to_string()).into_response()
                }
            },
            AppError::Persistence(err) => {
                error!(?err, "database error");
                JsonResponse::server_error("Database error").into_response()
            }
            AppError::Serialization(err) => {
                error!(?err, "serialization error");
                JsonResponse::server_error("Serialization error").into_response()
            }
        }
    }
}
