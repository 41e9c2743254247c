use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, AsyncConnectionConfig, Client as RedisClient};
use tokio::sync::OnceCell;

use super::KeyValueStore;
use crate::config::Config;
use crate::error::{StoreError, StoreResult};

/// 基于 Redis 的键值存储
///
/// 两阶段生命周期：`new` 只解析连接地址，`connect` 完成后才能发起操作。
/// 所有进程内调用共享同一个多路复用连接。
pub struct RedisStore {
    client: RedisClient,
    timeout: Duration,
    connection: OnceCell<MultiplexedConnection>,
}

impl RedisStore {
    pub fn new(config: &Config) -> StoreResult<Self> {
        let client = RedisClient::open(config.redis_url.as_str())
            .map_err(|e| StoreError::ConnectionUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            timeout: config.store_timeout(),
            connection: OnceCell::new(),
        })
    }

    /// 建立连接并校验可用性，重复调用不会重新连接
    pub async fn connect(&self) -> StoreResult<()> {
        self.connection
            .get_or_try_init(|| async {
                let config = AsyncConnectionConfig::new()
                    .set_connection_timeout(self.timeout)
                    .set_response_timeout(self.timeout);
                let mut conn = self
                    .client
                    .get_multiplexed_async_connection_with_config(&config)
                    .await
                    .map_err(|e| StoreError::ConnectionUnavailable(e.to_string()))?;

                let pong: String = redis::cmd("PING")
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| StoreError::ConnectionUnavailable(e.to_string()))?;
                tracing::info!(reply = %pong, "Connected to Redis session store");

                Ok::<_, StoreError>(conn)
            })
            .await?;

        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    fn connection(&self) -> StoreResult<MultiplexedConnection> {
        self.connection.get().cloned().ok_or_else(|| {
            StoreError::ConnectionUnavailable("redis connection has not been initialized".into())
        })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.connection()?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.connection()?;
        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn replace_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> StoreResult<bool> {
        let mut conn = self.connection()?;
        // 键不存在时返回 nil，不会重新创建已删除或已过期的记录
        let reply: redis::Value = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .arg("XX")
            .query_async(&mut conn)
            .await?;
        Ok(!matches!(reply, redis::Value::Nil))
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let mut conn = self.connection()?;
        // -2 表示键不存在，-1 表示没有过期时间
        let secs: i64 = conn.ttl(key).await?;
        Ok((secs >= 0).then(|| Duration::from_secs(secs as u64)))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.connection()?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn add_to_set(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut conn = self.connection()?;
        let _: () = conn.sadd(key, member).await?;
        Ok(())
    }

    async fn remove_from_set(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut conn = self.connection()?;
        let _: () = conn.srem(key, member).await?;
        Ok(())
    }

    async fn members_of_set(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.connection()?;
        let members: Vec<String> = conn.smembers(key).await?;
        Ok(members)
    }

    async fn cardinality(&self, key: &str) -> StoreResult<u64> {
        let mut conn = self.connection()?;
        let count: u64 = conn.scard(key).await?;
        Ok(count)
    }

    async fn keys_matching(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.connection()?;
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }
}
