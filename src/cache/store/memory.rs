use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::KeyValueStore;
use crate::error::{StoreError, StoreResult};

enum Value {
    Str(String),
    Set(HashSet<String>),
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// 进程内键值存储，语义与 Redis 保持一致（过期、空集合自动删除）
///
/// 过期时间基于 `tokio::time::Instant`，测试中可以暂停并推进时间。
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已执行的写操作次数
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// 当前未过期的键数量
    pub async fn len(&self) -> usize {
        let mut entries = self.entries.lock().await;
        evict_all_expired(&mut entries);
        entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}

/// 超出时钟范围的过期时间视为永不过期
fn deadline(ttl: Duration) -> Option<Instant> {
    Instant::now().checked_add(ttl)
}

fn evict_expired(entries: &mut HashMap<String, Entry>, key: &str) {
    let now = Instant::now();
    if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
        entries.remove(key);
    }
}

fn evict_all_expired(entries: &mut HashMap<String, Entry>) {
    let now = Instant::now();
    entries.retain(|_, entry| !entry.is_expired(now));
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut entries = self.entries.lock().await;
        evict_expired(&mut entries, key);

        match entries.get(key) {
            Some(Entry {
                value: Value::Str(value),
                ..
            }) => Ok(Some(value.clone())),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(None),
        }
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: deadline(ttl),
            },
        );
        self.record_write();
        Ok(())
    }

    async fn replace_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> StoreResult<bool> {
        let mut entries = self.entries.lock().await;
        evict_expired(&mut entries, key);

        match entries.get_mut(key) {
            Some(entry) => {
                entry.value = Value::Str(value.to_string());
                entry.expires_at = deadline(ttl);
                self.record_write();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let mut entries = self.entries.lock().await;
        evict_expired(&mut entries, key);

        let now = Instant::now();
        Ok(entries
            .get(key)
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        self.record_write();
        Ok(())
    }

    async fn add_to_set(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().await;
        evict_expired(&mut entries, key);

        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Set(HashSet::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Set(members) => {
                members.insert(member.to_string());
            }
            Value::Str(_) => return Err(StoreError::WrongType(key.to_string())),
        }
        self.record_write();
        Ok(())
    }

    async fn remove_from_set(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().await;
        evict_expired(&mut entries, key);

        let now_empty = match entries.get_mut(key) {
            Some(Entry {
                value: Value::Set(members),
                ..
            }) => {
                members.remove(member);
                members.is_empty()
            }
            Some(_) => return Err(StoreError::WrongType(key.to_string())),
            None => return Ok(()),
        };
        // 与 Redis 一致：集合为空时键被删除
        if now_empty {
            entries.remove(key);
        }
        self.record_write();
        Ok(())
    }

    async fn members_of_set(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut entries = self.entries.lock().await;
        evict_expired(&mut entries, key);

        match entries.get(key) {
            Some(Entry {
                value: Value::Set(members),
                ..
            }) => Ok(members.iter().cloned().collect()),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn cardinality(&self, key: &str) -> StoreResult<u64> {
        let mut entries = self.entries.lock().await;
        evict_expired(&mut entries, key);

        match entries.get(key) {
            Some(Entry {
                value: Value::Set(members),
                ..
            }) => Ok(members.len() as u64),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(0),
        }
    }

    async fn keys_matching(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut entries = self.entries.lock().await;
        evict_all_expired(&mut entries);

        Ok(entries
            .keys()
            .filter(|key| glob_matches(pattern.as_bytes(), key.as_bytes()))
            .cloned()
            .collect())
    }
}

/// 与 Redis `KEYS` 一致的 glob 匹配：`*`、`?`、`[...]`（支持 `^` 取反和区间），`\` 转义
fn glob_matches(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some(b'*') => {
            glob_matches(&pattern[1..], text)
                || (!text.is_empty() && glob_matches(pattern, &text[1..]))
        }
        Some(b'?') => !text.is_empty() && glob_matches(&pattern[1..], &text[1..]),
        Some(b'[') => match (class_end(pattern), text.split_first()) {
            (Some(end), Some((&c, rest))) => {
                class_matches(&pattern[1..end], c) && glob_matches(&pattern[end + 1..], rest)
            }
            (Some(_), None) => false,
            // 未闭合的 `[` 按普通字符处理
            (None, _) => text.first() == Some(&b'[') && glob_matches(&pattern[1..], &text[1..]),
        },
        Some(b'\\') if pattern.len() > 1 => {
            text.first() == Some(&pattern[1]) && glob_matches(&pattern[2..], &text[1..])
        }
        Some(p) => text.first() == Some(p) && glob_matches(&pattern[1..], &text[1..]),
    }
}

/// 以 `[` 开头的字符类的结束位置
fn class_end(pattern: &[u8]) -> Option<usize> {
    let mut i = 1;
    while i < pattern.len() {
        match pattern[i] {
            b'\\' => i += 2,
            b']' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn class_matches(class: &[u8], c: u8) -> bool {
    let (negate, class) = match class.split_first() {
        Some((b'^', rest)) => (true, rest),
        _ => (false, class),
    };

    let mut matched = false;
    let mut i = 0;
    while i < class.len() {
        if class[i] == b'\\' && i + 1 < class.len() {
            matched |= class[i + 1] == c;
            i += 2;
        } else if i + 2 < class.len() && class[i + 1] == b'-' {
            let (lo, hi) = (class[i].min(class[i + 2]), class[i].max(class[i + 2]));
            matched |= (lo..=hi).contains(&c);
            i += 3;
        } else {
            matched |= class[i] == c;
            i += 1;
        }
    }
    matched != negate
}
