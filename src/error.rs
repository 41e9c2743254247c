use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::result::{ApiResult, codes};

/// 键值存储层错误
///
/// 会话不存在不是错误，由各操作以 `None` / `false` 表示。
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key-value store unavailable: {0}")]
    ConnectionUnavailable(String),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("invalid user id: {0}")]
    InvalidUserId(String),

    #[error("key {0} holds the wrong kind of value")]
    WrongType(String),

    #[error("failed to encode session record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    /// 存储是否不可达（未初始化、连接被拒、超时或断开）
    pub fn is_unavailable(&self) -> bool {
        match self {
            StoreError::ConnectionUnavailable(_) => true,
            StoreError::Redis(e) => {
                e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout()
            }
            _ => false,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    Forbidden,
    BadRequest(String),
    StoreUnavailable,
    InternalServerError,
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        if let StoreError::InvalidUserId(message) = err {
            return AppError::BadRequest(message);
        }

        tracing::error!(error = %err, "Session store operation failed");
        if err.is_unavailable() {
            AppError::StoreUnavailable
        } else {
            AppError::InternalServerError
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error_message) = match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                codes::UNAUTHORIZED,
                "未授权访问".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                codes::FORBIDDEN,
                "无权访问该用户的会话".to_string(),
            ),
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, codes::VALIDATION_ERROR, message)
            }
            AppError::StoreUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                codes::STORE_UNAVAILABLE,
                "会话存储不可用".to_string(),
            ),
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL_ERROR,
                "内部服务器错误".to_string(),
            ),
        };

        let body = Json(ApiResult::<()>::error(code, &error_message));

        (status, body).into_response()
    }
}
