use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kbridge::errors::BridgeError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// 请求处理错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 请求数据验证错误
    #[error("{0}")]
    Validation(String),
    /// 核心库错误
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Bridge(BridgeError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Bridge(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("请求处理失败：{self}");
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
