use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cache::keys::SessionKeys;
use crate::cache::models::session::{SessionId, SessionPayload, SessionRecord, strip_reserved};
use crate::cache::operations::user_index::UserSessionIndex;
use crate::cache::store::KeyValueStore;
use crate::error::{StoreError, StoreResult};

/// 会话缓存操作
///
/// 会话记录与用户索引是两次独立写入，不构成事务：创建时先写记录再加索引，
/// 删除时先删记录再移除索引。中途失败留下的悬空索引由
/// [`UserSessionIndex::list_sessions`] 清理，孤立记录由过期时间回收。
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    keys: SessionKeys,
    index: UserSessionIndex,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, keys: SessionKeys, ttl: Duration) -> Self {
        let index = UserSessionIndex::new(kv.clone(), keys.clone());
        Self {
            kv,
            keys,
            index,
            ttl,
        }
    }

    pub fn index(&self) -> &UserSessionIndex {
        &self.index
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 创建会话并加入用户索引
    ///
    /// 用户ID不能为空，否则无法从会话ID和索引键中还原所属用户。
    pub async fn create_session(
        &self,
        user_id: &str,
        mut payload: SessionPayload,
    ) -> StoreResult<SessionId> {
        if user_id.is_empty() {
            return Err(StoreError::InvalidUserId("user id must not be empty".into()));
        }

        let dropped = strip_reserved(&mut payload);
        if !dropped.is_empty() {
            debug!(user_id = %user_id, fields = ?dropped, "Ignoring reserved session fields");
        }

        let now = Utc::now().timestamp_millis();
        let session_id = SessionId::generate(user_id, now);
        let record = SessionRecord::new(user_id, payload, now);

        self.write(&session_id, &record).await?;
        self.index.add_member(user_id, &session_id).await?;

        info!(user_id = %user_id, session_id = %session_id, "Created session");
        Ok(session_id)
    }

    /// 获取会话，命中时记录本次访问并重置过期时间
    ///
    /// 返回本次访问之前的记录，`lastAccess` 为上一次访问的时间。
    pub async fn get_session(&self, session_id: &SessionId) -> StoreResult<Option<SessionRecord>> {
        let Some(record) = self.load(session_id).await? else {
            debug!(session_id = %session_id, "Session not found");
            return Ok(None);
        };

        let mut accessed = record.clone();
        accessed.touch(Utc::now().timestamp_millis());
        // 读取与续期之间记录可能已经过期或被删除，此时不会重新写入
        if !self.replace(session_id, &accessed).await? {
            debug!(session_id = %session_id, "Session vanished before refresh");
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// 合并字段并重置过期时间，会话不存在时返回 `false` 且不写入
    ///
    /// 读和写之间没有锁，同一会话的并发更新可能互相覆盖。
    pub async fn update_session(
        &self,
        session_id: &SessionId,
        mut partial: SessionPayload,
    ) -> StoreResult<bool> {
        let Some(mut record) = self.load(session_id).await? else {
            debug!(session_id = %session_id, "Skipping update of missing session");
            return Ok(false);
        };

        let dropped = strip_reserved(&mut partial);
        if !dropped.is_empty() {
            debug!(session_id = %session_id, fields = ?dropped, "Ignoring reserved session fields");
        }

        record.merge(partial, Utc::now().timestamp_millis());
        if !self.replace(session_id, &record).await? {
            debug!(session_id = %session_id, "Session vanished before update");
            return Ok(false);
        }

        debug!(session_id = %session_id, "Updated session");
        Ok(true)
    }

    /// 删除会话及其索引条目，会话不存在时不做任何处理
    pub async fn destroy_session(&self, session_id: &SessionId) -> StoreResult<()> {
        // 记录已失效时从ID中解析所属用户，以便清理残留索引
        let owner = match self.load(session_id).await? {
            Some(record) => Some(record.user_id),
            None => session_id.owner().map(str::to_owned),
        };

        self.kv.delete(&self.keys.session_key(session_id)).await?;

        match owner {
            Some(user_id) => {
                self.index.remove_member(&user_id, session_id).await?;
                info!(user_id = %user_id, session_id = %session_id, "Destroyed session");
            }
            None => warn!(session_id = %session_id, "Destroyed session with no resolvable owner"),
        }

        Ok(())
    }

    /// 会话剩余的过期时间
    pub async fn session_ttl(&self, session_id: &SessionId) -> StoreResult<Option<Duration>> {
        self.kv.ttl(&self.keys.session_key(session_id)).await
    }

    /// 读取记录但不续期，无法解析的记录视为不存在
    pub(crate) async fn load(&self, session_id: &SessionId) -> StoreResult<Option<SessionRecord>> {
        let key = self.keys.session_key(session_id);
        let Some(json) = self.kv.get(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<SessionRecord>(&json) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Discarding unreadable session record");
                Ok(None)
            }
        }
    }

    async fn write(&self, session_id: &SessionId, record: &SessionRecord) -> StoreResult<()> {
        let json = serde_json::to_string(record)?;
        self.kv
            .set_with_expiry(&self.keys.session_key(session_id), &json, self.ttl)
            .await
    }

    /// 覆盖仍然存在的记录，已被删除或过期的会话不会被重新创建
    async fn replace(&self, session_id: &SessionId, record: &SessionRecord) -> StoreResult<bool> {
        let json = serde_json::to_string(record)?;
        self.kv
            .replace_with_expiry(&self.keys.session_key(session_id), &json, self.ttl)
            .await
    }
}
