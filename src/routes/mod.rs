use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    AppState,
    middleware::{internal_key_middleware, session_middleware},
};

pub mod session;

/// 会话接口路由
///
/// - 会话签发与管理统计只供内部服务调用，需要携带 `X-Internal-Key`
/// - 其余接口需要 `Authorization: Bearer <session_id>`，且只能访问本人的会话
pub fn router(state: AppState) -> Router {
    let internal = Router::new()
        .route("/sessions", post(session::create_session))
        .route("/admin/active-users", get(session::active_users))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            internal_key_middleware,
        ));

    let authenticated = Router::new()
        .route(
            "/sessions/current",
            get(session::current_session)
                .patch(session::update_current_session)
                .delete(session::destroy_current_session),
        )
        .route(
            "/users/{user_id}/sessions",
            get(session::user_sessions).delete(session::destroy_user_sessions),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    Router::new()
        .route("/health", get(session::health))
        .merge(internal)
        .merge(authenticated)
        .with_state(state)
}
