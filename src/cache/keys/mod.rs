/// 缓存键模块
/// 提供会话缓存键生成函数
pub mod session_keys;

pub use session_keys::SessionKeys;
