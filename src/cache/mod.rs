// 缓存模块
// 包含会话缓存数据结构、键值存储和操作逻辑

pub mod keys;
pub mod models;
pub mod operations;
pub mod store;

// 重新导出常用类型，方便其他模块使用
pub use keys::SessionKeys;
pub use models::{ActiveUser, SessionId, SessionPayload, SessionRecord, UserSession};
pub use operations::{ActiveUserAggregator, SessionStore, UserSessionIndex};
pub use store::{KeyValueStore, MemoryStore, RedisStore};
