pub mod handler;

use std::borrow::Cow;

use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use domain::{DomainError, DomainErrorKind};

/// API結果
pub type ApiResult<T> = Result<T, ApiError>;

/// APIエラー
#[derive(Debug)]
pub struct ApiError {
    /// HTTPステータスコード
    pub status_code: StatusCode,
    /// エラーメッセージ
    pub messages: Vec<Cow<'static, str>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "messages": self.messages,
        });
        (self.status_code, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        let status_code = match error.kind {
            DomainErrorKind::Validation => StatusCode::BAD_REQUEST,
            DomainErrorKind::Repository => StatusCode::INTERNAL_SERVER_ERROR,
            DomainErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status_code.is_server_error() {
            tracing::error!(error = %error, "request failed");
        }
        Self {
            status_code,
            messages: error.messages,
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status_code: StatusCode::BAD_REQUEST,
            messages: vec![rejection.body_text().into()],
        }
    }
}
