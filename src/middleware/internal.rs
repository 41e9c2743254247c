use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{AppState, error::AppError};

/// 服务间调用携带的密钥请求头
pub const INTERNAL_KEY_HEADER: &str = "x-internal-key";

/// 校验服务间密钥，保护会话签发和管理接口
///
/// 未配置 `INTERNAL_API_KEY` 时一律返回 401。
pub async fn internal_key_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.internal_api_key.as_deref() else {
        tracing::warn!(uri = %req.uri(), "Internal endpoint called but no internal key is configured");
        return Err(AppError::Unauthorized);
    };

    let provided = req
        .headers()
        .get(INTERNAL_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(key) if keys_match(key.as_bytes(), expected.as_bytes()) => Ok(next.run(req).await),
        _ => {
            tracing::debug!(uri = %req.uri(), "Rejected internal request with missing or wrong key");
            Err(AppError::Unauthorized)
        }
    }
}

/// 比较耗时与第一个不同字节的位置无关
fn keys_match(provided: &[u8], expected: &[u8]) -> bool {
    provided.len() == expected.len()
        && provided
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}
