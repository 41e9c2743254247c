use futures_util::future::try_join_all;
use tracing::debug;

use crate::cache::models::session::ActiveUser;
use crate::cache::operations::user_index::UserSessionIndex;
use crate::error::StoreResult;

/// 在线用户统计
///
/// 通过模式匹配遍历所有索引键，开销与有过会话的用户总数成正比。
/// 用户规模较小时可以接受，规模增长后应改为显式维护的计数索引。
#[derive(Clone)]
pub struct ActiveUserAggregator {
    index: UserSessionIndex,
}

impl ActiveUserAggregator {
    pub fn new(index: UserSessionIndex) -> Self {
        Self { index }
    }

    /// 列出至少持有一个会话的用户，按用户ID排序
    ///
    /// 计数取自索引基数，尚未被清理的过期条目也会计入。
    pub async fn list_active_users(&self) -> StoreResult<Vec<ActiveUser>> {
        let users = self.index.indexed_users().await?;
        let counts = try_join_all(users.iter().map(|user_id| self.index.cardinality(user_id))).await?;

        let mut active: Vec<ActiveUser> = users
            .into_iter()
            .zip(counts)
            .filter(|(_, count)| *count > 0)
            .map(|(user_id, session_count)| ActiveUser {
                user_id,
                session_count,
            })
            .collect();
        active.sort_by(|a, b| a.user_id.cmp(&b.user_id));

        debug!(users = active.len(), "Aggregated active users");
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::keys::SessionKeys;
    use crate::cache::models::session::SessionPayload;
    use crate::cache::operations::session::SessionStore;
    use crate::cache::store::{KeyValueStore, MemoryStore};
    use std::sync::Arc;
    use std::time::Duration;

    fn setup() -> (Arc<MemoryStore>, SessionStore, ActiveUserAggregator) {
        let kv = Arc::new(MemoryStore::new());
        let store = SessionStore::new(kv.clone(), SessionKeys::default(), Duration::from_secs(60));
        let aggregator = ActiveUserAggregator::new(store.index().clone());
        (kv, store, aggregator)
    }

    #[tokio::test]
    async fn counts_sessions_per_user() {
        let (_, store, aggregator) = setup();
        store.create_session("u2", SessionPayload::new()).await.unwrap();
        store.create_session("u1", SessionPayload::new()).await.unwrap();
        store.create_session("u1", SessionPayload::new()).await.unwrap();

        let users = aggregator.list_active_users().await.unwrap();

        assert_eq!(
            users,
            vec![
                ActiveUser {
                    user_id: "u1".into(),
                    session_count: 2
                },
                ActiveUser {
                    user_id: "u2".into(),
                    session_count: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn users_without_sessions_are_not_listed() {
        let (_, store, aggregator) = setup();
        let id = store.create_session("u1", SessionPayload::new()).await.unwrap();
        store.destroy_session(&id).await.unwrap();

        assert!(aggregator.list_active_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ignores_keys_outside_the_index_namespace() {
        let (kv, store, aggregator) = setup();
        store.create_session("u1", SessionPayload::new()).await.unwrap();
        kv.add_to_set("groups:u9", "x").await.unwrap();

        let users = aggregator.list_active_users().await.unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id, "u1");
    }

    #[tokio::test]
    async fn prefix_with_glob_characters_matches_literally() {
        let kv = Arc::new(MemoryStore::new());
        let store = SessionStore::new(
            kv.clone(),
            SessionKeys::new("s:", "us?:"),
            Duration::from_secs(60),
        );
        let aggregator = ActiveUserAggregator::new(store.index().clone());
        store.create_session("u1", SessionPayload::new()).await.unwrap();
        kv.add_to_set("usx:u9", "x").await.unwrap();

        let users = aggregator.list_active_users().await.unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id, "u1");
    }
}
