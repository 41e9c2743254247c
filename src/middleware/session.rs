use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use crate::{
    AppState,
    cache::{SessionId, SessionRecord},
    error::AppError,
};

/// 当前请求所属的会话，由 [`session_middleware`] 注入请求扩展
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub session_id: SessionId,
    pub record: SessionRecord,
}

/// 从 `Authorization: Bearer <session_id>` 解析会话
///
/// 读取会话会重置其过期时间；会话不存在或已过期时返回 401。
pub async fn session_middleware(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Ok(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(AppError::Unauthorized);
    };

    let session_id = SessionId::from(bearer.token());
    let Some(record) = state.sessions.get_session(&session_id).await? else {
        tracing::debug!(session_id = %session_id, "Rejected request with unknown session");
        return Err(AppError::Unauthorized);
    };

    req.extensions_mut()
        .insert(CurrentSession { session_id, record });
    Ok(next.run(req).await)
}
