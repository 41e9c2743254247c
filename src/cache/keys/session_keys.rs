use crate::cache::models::session::SessionId;
use crate::config::Config;

/// 会话相关的缓存键生成
#[derive(Debug, Clone)]
pub struct SessionKeys {
    session_prefix: String,
    user_sessions_prefix: String,
}

impl SessionKeys {
    pub fn new(session_prefix: impl Into<String>, user_sessions_prefix: impl Into<String>) -> Self {
        Self {
            session_prefix: session_prefix.into(),
            user_sessions_prefix: user_sessions_prefix.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.session_key_prefix, &config.user_sessions_prefix)
    }

    /// 生成会话记录键
    pub fn session_key(&self, session_id: &SessionId) -> String {
        format!("{}{}", self.session_prefix, session_id)
    }

    /// 生成用户会话索引键
    pub fn user_sessions_key(&self, user_id: &str) -> String {
        format!("{}{}", self.user_sessions_prefix, user_id)
    }

    /// 匹配所有用户会话索引键的模式，前缀中的 glob 元字符按字面匹配
    pub fn user_sessions_pattern(&self) -> String {
        format!("{}*", escape_glob(&self.user_sessions_prefix))
    }

    /// 从索引键中取出用户ID
    pub fn user_id_from_index_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.user_sessions_prefix.as_str())
            .filter(|user_id| !user_id.is_empty())
    }
}

fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Default for SessionKeys {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_key_round_trips_user_id() {
        let keys = SessionKeys::default();
        let key = keys.user_sessions_key("u1");

        assert_eq!(key, "user_sessions:u1");
        assert_eq!(keys.user_id_from_index_key(&key), Some("u1"));
        assert_eq!(keys.user_id_from_index_key("session:u1"), None);
        assert_eq!(keys.user_id_from_index_key("user_sessions:"), None);
    }

    #[test]
    fn custom_prefixes_are_applied() {
        let keys = SessionKeys::new("app:s:", "app:us:");
        let id = SessionId::from("u1:1:abc");

        assert_eq!(keys.session_key(&id), "app:s:u1:1:abc");
        assert_eq!(keys.user_sessions_pattern(), "app:us:*");
    }

    #[test]
    fn glob_characters_in_prefix_are_escaped() {
        let keys = SessionKeys::new("s:", "us[1]*:");

        assert_eq!(keys.user_sessions_pattern(), r"us\[1\]\*:*");
        assert_eq!(keys.user_id_from_index_key("us[1]*:u1"), Some("u1"));
    }
}
