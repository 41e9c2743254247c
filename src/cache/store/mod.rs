//! 会话层依赖的键值存储原语
//!
//! 生产环境使用 [`RedisStore`]，测试和本地开发使用 [`MemoryStore`]。

pub mod memory;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreResult;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

/// 键值存储
///
/// 每次调用都受存储客户端自身的超时约束，本层不做重试。
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// 仅当键存在时覆盖其值并重置过期时间（`SET .. EX .. XX`），键不存在时返回 `false`
    async fn replace_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> StoreResult<bool>;

    /// 剩余过期时间，键不存在或未设置过期时返回 `None`
    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>>;

    async fn delete(&self, key: &str) -> StoreResult<()>;

    async fn add_to_set(&self, key: &str, member: &str) -> StoreResult<()>;

    async fn remove_from_set(&self, key: &str, member: &str) -> StoreResult<()>;

    async fn members_of_set(&self, key: &str) -> StoreResult<Vec<String>>;

    async fn cardinality(&self, key: &str) -> StoreResult<u64>;

    /// 按 glob 模式（`*`、`?`、`[...]`，`\` 转义）列出键
    async fn keys_matching(&self, pattern: &str) -> StoreResult<Vec<String>>;
}
