use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct JsonResponse {
    pub status: String,
    pub success: bool,
    pub message: String,
    pub code: Option<String>,
}

impl JsonResponse {
    pub fn success(msg: &str) -> impl IntoResponse {
        (
            StatusCode::OK,
            Json(JsonResponse {
                status: "success".to_string(),
                success: true,
                message: msg.to_string(),
                code: None,
            }),
        )
    }

    fn error(status: StatusCode, msg: &str, code: &str) -> impl IntoResponse {
        (
            status,
            Json(JsonResponse {
                status: "error".to_string(),
                success: false,
                message: msg.to_string(),
                code: Some(code.to_string()),
            }),
        )
    }

    pub fn unprocessable(msg: &str) -> impl IntoResponse {
        Self::error(StatusCode::UNPROCESSABLE_ENTITY, msg, "VALIDATION_ERROR")
    }

    pub fn provider_rejected(msg: &str) -> impl IntoResponse {
        Self::error(StatusCode::UNPROCESSABLE_ENTITY, msg, "PROVIDER_ERROR")
    }

    pub fn forbidden(msg: &str) -> impl IntoResponse {
        Self::error(StatusCode::FORBIDDEN, msg, "CONFLICT")
    }

    pub fn bad_request(msg: &str) -> impl IntoResponse {
        Self::error(StatusCode::BAD_REQUEST, msg, "BAD_SIGNATURE")
    }

    pub fn server_error(msg: &str) -> impl IntoResponse {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, msg, "INTERNAL_ERROR")
    }
}
