use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    cache::{ActiveUser, SessionPayload, UserSession},
    error::AppError,
    middleware::CurrentSession,
    result::{ApiResponse, ApiResult, ok},
};

use super::model::{
    CreateSessionRequest, CreateSessionResponse, DestroySessionsResponse, HealthResponse,
    SessionSummary, UpdateSessionResponse, is_valid_user_id,
};

fn check_user_id(user_id: &str) -> Result<(), AppError> {
    if is_valid_user_id(user_id) {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "用户ID格式无效，只允许使用字母、数字、下划线和连字符".to_string(),
        ))
    }
}

/// 只允许访问当前会话所属用户的数据
fn check_owner(current: &CurrentSession, user_id: &str) -> Result<(), AppError> {
    check_user_id(user_id)?;
    if current.record.user_id == user_id {
        Ok(())
    } else {
        tracing::warn!(
            session_id = %current.session_id,
            owner = %current.record.user_id,
            requested = %user_id,
            "Rejected access to another user's sessions"
        );
        Err(AppError::Forbidden)
    }
}

pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthResponse> {
    ok(HealthResponse {
        status: "ok",
        session_ttl_secs: state.config.session_ttl_secs,
    })
}

#[axum::debug_handler]
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ApiResult<CreateSessionResponse>>), AppError> {
    check_user_id(&req.user_id)?;

    let session_id = state
        .sessions
        .create_session(&req.user_id, req.payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResult::success(CreateSessionResponse { session_id })),
    ))
}

pub async fn current_session(
    Extension(current): Extension<CurrentSession>,
) -> ApiResponse<UserSession> {
    ok(UserSession {
        session_id: current.session_id,
        record: current.record,
    })
}

#[axum::debug_handler]
pub async fn update_current_session(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Json(partial): Json<SessionPayload>,
) -> ApiResponse<UpdateSessionResponse> {
    let updated = state
        .sessions
        .update_session(&current.session_id, partial)
        .await?;

    ok(UpdateSessionResponse { updated })
}

pub async fn destroy_current_session(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Result<StatusCode, AppError> {
    state.sessions.destroy_session(&current.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 列出当前用户的全部会话，不返回会话ID
pub async fn user_sessions(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(user_id): Path<String>,
) -> ApiResponse<Vec<SessionSummary>> {
    check_owner(&current, &user_id)?;

    let mut sessions: Vec<SessionSummary> = state
        .sessions
        .get_user_sessions(&user_id)
        .await?
        .into_iter()
        .map(|session| SessionSummary {
            current: session.session_id == current.session_id,
            session: session.record,
        })
        .collect();
    sessions.sort_by_key(|summary| summary.session.created_at);

    ok(sessions)
}

/// 注销当前用户的全部会话（包括当前会话）
pub async fn destroy_user_sessions(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(user_id): Path<String>,
) -> ApiResponse<DestroySessionsResponse> {
    check_owner(&current, &user_id)?;
    let destroyed = state.sessions.destroy_all_user_sessions(&user_id).await?;
    ok(DestroySessionsResponse { destroyed })
}

pub async fn active_users(State(state): State<AppState>) -> ApiResponse<Vec<ActiveUser>> {
    ok(state.sessions.get_active_users().await?)
}
