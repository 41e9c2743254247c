use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::{debug, info, warn};

use crate::cache::keys::SessionKeys;
use crate::cache::models::session::{SessionId, UserSession};
use crate::cache::operations::session::SessionStore;
use crate::cache::store::KeyValueStore;
use crate::error::StoreResult;

/// 用户会话索引操作
///
/// 索引只是派生缓存，会话是否存在始终以会话记录为准。
#[derive(Clone)]
pub struct UserSessionIndex {
    kv: Arc<dyn KeyValueStore>,
    keys: SessionKeys,
}

impl UserSessionIndex {
    pub fn new(kv: Arc<dyn KeyValueStore>, keys: SessionKeys) -> Self {
        Self { kv, keys }
    }

    pub(crate) async fn add_member(&self, user_id: &str, session_id: &SessionId) -> StoreResult<()> {
        self.kv
            .add_to_set(&self.keys.user_sessions_key(user_id), session_id.as_str())
            .await
    }

    pub(crate) async fn remove_member(
        &self,
        user_id: &str,
        session_id: &SessionId,
    ) -> StoreResult<()> {
        self.kv
            .remove_from_set(&self.keys.user_sessions_key(user_id), session_id.as_str())
            .await
    }

    /// 索引中的全部会话ID（可能包含已失效的条目）
    pub async fn members(&self, user_id: &str) -> StoreResult<Vec<SessionId>> {
        let members = self
            .kv
            .members_of_set(&self.keys.user_sessions_key(user_id))
            .await?;
        Ok(members.into_iter().map(SessionId::from).collect())
    }

    pub async fn cardinality(&self, user_id: &str) -> StoreResult<u64> {
        self.kv.cardinality(&self.keys.user_sessions_key(user_id)).await
    }

    /// 所有存在索引键的用户
    pub async fn indexed_users(&self) -> StoreResult<Vec<String>> {
        let keys = self
            .kv
            .keys_matching(&self.keys.user_sessions_pattern())
            .await?;

        Ok(keys
            .iter()
            .filter_map(|key| self.keys.user_id_from_index_key(key))
            .map(str::to_owned)
            .collect())
    }

    /// 列出用户的有效会话
    ///
    /// 记录已不存在、无法解析或属于其他用户的条目会从索引中移除，不返回给调用方。
    /// 读取不会重置会话的过期时间。
    pub async fn list_sessions(
        &self,
        store: &SessionStore,
        user_id: &str,
    ) -> StoreResult<Vec<UserSession>> {
        let members = self.members(user_id).await?;
        let records = try_join_all(members.iter().map(|id| store.load(id))).await?;

        let mut live = Vec::with_capacity(members.len());
        let mut stale = Vec::new();
        for (session_id, record) in members.into_iter().zip(records) {
            match record {
                Some(record) if record.user_id == user_id => {
                    live.push(UserSession { session_id, record })
                }
                _ => stale.push(session_id),
            }
        }

        if !stale.is_empty() {
            warn!(user_id = %user_id, pruned = stale.len(), "Pruning stale session index entries");
            try_join_all(stale.iter().map(|id| self.remove_member(user_id, id))).await?;
        }

        debug!(user_id = %user_id, sessions = live.len(), "Listed user sessions");
        Ok(live)
    }

    /// 删除用户的全部会话，然后删除索引本身，返回处理的会话数
    pub async fn destroy_all(&self, store: &SessionStore, user_id: &str) -> StoreResult<usize> {
        let members = self.members(user_id).await?;

        // ID 中编码的所属用户不一致的条目只随索引一起丢弃，不触碰其他用户的会话
        let (owned, foreign): (Vec<_>, Vec<_>) = members
            .into_iter()
            .partition(|id| id.owner() == Some(user_id));
        if !foreign.is_empty() {
            warn!(user_id = %user_id, skipped = foreign.len(), "Index held sessions of other users");
        }

        try_join_all(owned.iter().map(|id| store.destroy_session(id))).await?;
        self.kv.delete(&self.keys.user_sessions_key(user_id)).await?;

        info!(user_id = %user_id, destroyed = owned.len(), "Destroyed all user sessions");
        Ok(owned.len())
    }
}
