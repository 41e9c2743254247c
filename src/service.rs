use std::sync::Arc;
use std::time::Duration;

use crate::cache::{
    ActiveUser, ActiveUserAggregator, KeyValueStore, SessionId, SessionKeys, SessionPayload,
    SessionRecord, SessionStore, UserSession,
};
use crate::config::Config;
use crate::error::StoreResult;

/// 会话服务，供认证中间件和管理接口调用
///
/// 存储客户端由调用方注入；使用 [`crate::cache::RedisStore`] 时须先完成 `connect()`。
/// 会话不存在不会作为错误返回，调用方无需特殊处理。
#[derive(Clone)]
pub struct SessionService {
    store: SessionStore,
    aggregator: ActiveUserAggregator,
}

impl SessionService {
    pub fn new(kv: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        let store = SessionStore::new(kv, SessionKeys::from_config(config), config.session_ttl());
        let aggregator = ActiveUserAggregator::new(store.index().clone());
        Self { store, aggregator }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn create_session(
        &self,
        user_id: &str,
        payload: SessionPayload,
    ) -> StoreResult<SessionId> {
        self.store.create_session(user_id, payload).await
    }

    pub async fn get_session(&self, session_id: &SessionId) -> StoreResult<Option<SessionRecord>> {
        self.store.get_session(session_id).await
    }

    pub async fn update_session(
        &self,
        session_id: &SessionId,
        partial: SessionPayload,
    ) -> StoreResult<bool> {
        self.store.update_session(session_id, partial).await
    }

    pub async fn destroy_session(&self, session_id: &SessionId) -> StoreResult<()> {
        self.store.destroy_session(session_id).await
    }

    pub async fn get_user_sessions(&self, user_id: &str) -> StoreResult<Vec<UserSession>> {
        self.store.index().list_sessions(&self.store, user_id).await
    }

    pub async fn destroy_all_user_sessions(&self, user_id: &str) -> StoreResult<usize> {
        self.store.index().destroy_all(&self.store, user_id).await
    }

    pub async fn get_active_users(&self) -> StoreResult<Vec<ActiveUser>> {
        self.aggregator.list_active_users().await
    }

    pub async fn session_ttl(&self, session_id: &SessionId) -> StoreResult<Option<Duration>> {
        self.store.session_ttl(session_id).await
    }
}
