use serde::{Deserialize, Serialize};

use crate::cache::{SessionId, SessionPayload, SessionRecord};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: String,
    #[serde(default)]
    pub payload: SessionPayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: SessionId,
}

/// 会话列表条目
///
/// 会话ID即访问凭证，列表中不返回，只标记哪一条是当前会话。
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub current: bool,
    pub session: SessionRecord,
}

#[derive(Debug, Serialize)]
pub struct UpdateSessionResponse {
    pub updated: bool,
}

#[derive(Debug, Serialize)]
pub struct DestroySessionsResponse {
    pub destroyed: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub session_ttl_secs: u64,
}

/// 用户ID只允许字母、数字、下划线和连字符
pub fn is_valid_user_id(user_id: &str) -> bool {
    !user_id.is_empty()
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
