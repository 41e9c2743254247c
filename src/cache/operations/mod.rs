/// 缓存操作
/// 提供会话缓存操作的功能实现

// 会话记录操作
pub mod session;

// 用户会话索引操作
pub mod user_index;

// 在线用户统计
pub mod active_users;

// 重新导出常用操作
pub use active_users::ActiveUserAggregator;
pub use session::SessionStore;
pub use user_index::UserSessionIndex;
