use std::env;
use std::time::Duration;

/// 会话记录键前缀
pub const DEFAULT_SESSION_PREFIX: &str = "session:";

/// 用户会话索引键前缀
pub const DEFAULT_USER_SESSIONS_PREFIX: &str = "user_sessions:";

/// 默认会话有效期（小时）
const DEFAULT_SESSION_TTL_HOURS: u64 = 24;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub redis_url: String,
    pub session_ttl_secs: u64,
    pub session_key_prefix: String,
    pub user_sessions_prefix: String,
    pub store_timeout_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    /// 签发会话和管理接口使用的服务间密钥，未配置时这些接口一律拒绝
    pub internal_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            redis_url: env::var("REDIS_URL")?,
            session_ttl_secs: parse_session_ttl_secs(&var_or("SESSION_TTL", "24h")),
            session_key_prefix: var_or("SESSION_KEY_PREFIX", DEFAULT_SESSION_PREFIX),
            user_sessions_prefix: var_or("USER_SESSIONS_PREFIX", DEFAULT_USER_SESSIONS_PREFIX),
            store_timeout_secs: var_or("STORE_TIMEOUT_SECS", "5").parse().unwrap_or(5),
            server_host: var_or("SERVER_HOST", "::"),
            server_port: var_or("SERVER_PORT", "3000").parse().unwrap_or(3000),
            api_base_uri: var_or("API_BASE_URI", "/api"),
            internal_api_key: env::var("INTERNAL_API_KEY").ok().filter(|key| !key.is_empty()),
        })
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_HOURS * 3600,
            session_key_prefix: DEFAULT_SESSION_PREFIX.to_string(),
            user_sessions_prefix: DEFAULT_USER_SESSIONS_PREFIX.to_string(),
            store_timeout_secs: 5,
            server_host: "::".to_string(),
            server_port: 3000,
            api_base_uri: "/api".to_string(),
            internal_api_key: None,
        }
    }
}

/// 解析以小时为单位的会话有效期（允许 `h` 后缀），返回秒数
fn parse_session_ttl_secs(raw: &str) -> u64 {
    let hours = raw
        .trim_end_matches('h')
        .parse::<u64>()
        .unwrap_or(DEFAULT_SESSION_TTL_HOURS);
    // Redis 不接受 0 秒的过期时间
    hours.saturating_mul(3600).max(1)
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ttl_parsing() {
        assert_eq!(parse_session_ttl_secs("24h"), 86400);
        assert_eq!(parse_session_ttl_secs("2"), 7200);
        assert_eq!(parse_session_ttl_secs("soon"), 86400);
        assert_eq!(parse_session_ttl_secs("0h"), 1);
        assert_eq!(parse_session_ttl_secs(&u64::MAX.to_string()), u64::MAX);
    }
}
