use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sms_errors::SmsError;
use tracing::error;

use crate::resources::strings;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("短信服务错误: {0}")]
    Sms(#[from] SmsError),

    #[error("未找到资源")]
    NotFound,

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            ApiError::Sms(SmsError::Validation(_)) => (
                StatusCode::BAD_REQUEST,
                "INVALID_PHONE",
                strings::PHONE_NUMBER_INVALID_ERROR,
            ),
            ApiError::Sms(SmsError::MalformedInput(_)) | ApiError::Sms(SmsError::Serialization(_)) => (
                StatusCode::BAD_REQUEST,
                "MALFORMED_REQUEST",
                strings::MALFORMED_REQUEST_ERROR,
            ),
            ApiError::Sms(SmsError::LifecycleRejection) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                strings::SERVICE_TEMPORARY_UNAVAILABLE,
            ),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", strings::NOT_FOUND_ERROR),
            ApiError::Sms(_) | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                strings::INTERNAL_SERVER_ERROR,
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            error!(status = status.as_u16(), "请求处理失败: {}", self);
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": code,
                "message": message,
            },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}
