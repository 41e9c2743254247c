use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// 记录中由存储维护的字段名
pub const USER_ID_FIELD: &str = "userId";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const LAST_ACCESS_FIELD: &str = "lastAccess";

const RESERVED_FIELDS: [&str; 3] = [USER_ID_FIELD, CREATED_AT_FIELD, LAST_ACCESS_FIELD];

/// 调用方提供的会话数据（扁平键值）
pub type SessionPayload = Map<String, Value>;

/// 会话ID，格式为 `{user_id}:{created_at_ms}:{random}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate(user_id: &str, created_at: i64) -> Self {
        Self(format!(
            "{}:{}:{}",
            user_id,
            created_at,
            Uuid::new_v4().simple()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ID 中编码的所属用户
    ///
    /// 从右侧切分，用户ID本身含有 `:` 时同样可以解析。
    pub fn owner(&self) -> Option<&str> {
        let mut parts = self.0.rsplitn(3, ':');
        let random = parts.next()?;
        let created_at = parts.next()?;
        let owner = parts.next()?;
        if random.is_empty() || created_at.parse::<i64>().is_err() || owner.is_empty() {
            return None;
        }
        Some(owner)
    }

    /// ID 中编码的创建时间（毫秒）
    pub fn created_at(&self) -> Option<i64> {
        self.owner()?;
        self.0.rsplitn(3, ':').nth(1)?.parse().ok()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// 会话记录，序列化为扁平 JSON 对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub user_id: String,
    pub created_at: i64, // Unix timestamp (ms)
    pub last_access: i64, // Unix timestamp (ms)
    #[serde(flatten)]
    pub payload: SessionPayload,
}

impl SessionRecord {
    pub fn new(user_id: &str, payload: SessionPayload, now: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            created_at: now,
            last_access: now,
            payload,
        }
    }

    /// 合并部分字段并更新最后访问时间
    pub fn merge(&mut self, partial: SessionPayload, now: i64) {
        self.payload.extend(partial);
        self.touch(now);
    }

    /// 记录一次访问
    pub fn touch(&mut self, now: i64) {
        self.last_access = now;
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }
}

/// 移除调用方数据中与保留字段同名的条目，返回被移除的字段名
pub fn strip_reserved(payload: &mut SessionPayload) -> Vec<&'static str> {
    RESERVED_FIELDS
        .into_iter()
        .filter(|field| payload.remove(*field).is_some())
        .collect()
}

/// 带ID的会话记录，用于按用户列出会话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub record: SessionRecord,
}

/// 在线用户统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUser {
    pub user_id: String,
    pub session_count: u64,
}
