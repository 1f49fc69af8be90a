use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::cache::traits::{CounterCache, WindowCount};
use crate::config::CacheConfig;
use crate::declare_counter_cache_plugin;
use crate::errors::{ClickerError, Result};

declare_counter_cache_plugin!("memory", MemoryCounterCache);

#[derive(Debug, Clone)]
enum Value {
    Int(i64),
    Text(String),
    Ranked(HashMap<String, i64>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    fn remaining_ms(&self, now: Instant) -> Option<u64> {
        self.expires_at
            .map(|at| at.saturating_duration_since(now).as_millis() as u64)
    }
}

fn wrong_type(key: &str) -> ClickerError {
    ClickerError::cache_unavailable(format!(
        "WRONGTYPE operation against key '{}' holding the wrong kind of value",
        key
    ))
}

/// 单进程内存计数缓存
///
/// 每个操作在 DashMap 分片锁内完成，因此对同一个键是原子的。
/// 过期采用惰性删除，容量满时先清理过期键。
pub struct MemoryCounterCache {
    entries: DashMap<String, Entry>,
    max_capacity: usize,
}

impl MemoryCounterCache {
    pub fn new(max_capacity: u64) -> Self {
        debug!("MemoryCounterCache created with capacity: {}", max_capacity);
        Self {
            entries: DashMap::new(),
            max_capacity: max_capacity as usize,
        }
    }

    pub async fn from_config(config: &CacheConfig) -> Result<Self> {
        Ok(Self::new(config.memory.max_capacity))
    }

    /// 当前保存的键数量（含尚未清理的过期键）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 新键写入前检查容量，不能在持有 entry 引用时调用
    fn ensure_capacity(&self, key: &str) -> Result<()> {
        if self.entries.contains_key(key) || self.entries.len() < self.max_capacity {
            return Ok(());
        }
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        if self.entries.len() >= self.max_capacity {
            return Err(ClickerError::cache_unavailable(format!(
                "memory cache is full ({} keys)",
                self.max_capacity
            )));
        }
        Ok(())
    }

    fn incr_entry(
        &self,
        key: &str,
        delta: i64,
        now: Instant,
    ) -> Result<dashmap::mapref::one::RefMut<'_, String, Entry>> {
        self.ensure_capacity(key)?;
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Int(0)));
        if entry.is_expired(now) {
            *entry = Entry::new(Value::Int(0));
        }
        let current = match &entry.value {
            Value::Int(v) => *v,
            Value::Text(s) => s.parse::<i64>().map_err(|_| {
                ClickerError::cache_unavailable(format!(
                    "value at '{}' is not an integer",
                    key
                ))
            })?,
            Value::Ranked(_) => return Err(wrong_type(key)),
        };
        let next = current.checked_add(delta).ok_or_else(|| {
            ClickerError::cache_unavailable(format!("increment at '{}' would overflow", key))
        })?;
        entry.value = Value::Int(next);
        Ok(entry)
    }

    fn with_ranked<T>(
        &self,
        key: &str,
        f: impl FnOnce(&mut HashMap<String, i64>) -> T,
    ) -> Result<T> {
        self.ensure_capacity(key)?;
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Ranked(HashMap::new())));
        if entry.is_expired(now) {
            *entry = Entry::new(Value::Ranked(HashMap::new()));
        }
        match &mut entry.value {
            Value::Ranked(members) => Ok(f(members)),
            _ => Err(wrong_type(key)),
        }
    }

    /// 只读访问有序集合，键不存在时返回 None
    fn read_ranked<T>(
        &self,
        key: &str,
        f: impl FnOnce(&HashMap<String, i64>) -> T,
    ) -> Result<Option<T>> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => match &entry.value {
                Value::Ranked(members) => Ok(Some(f(members))),
                _ => Err(wrong_type(key)),
            },
            _ => Ok(None),
        }
    }

    /// 与 Redis ZREVRANGE 相同的顺序：分数降序，同分按成员字典序降序
    fn sorted_desc(members: &HashMap<String, i64>) -> Vec<(String, i64)> {
        let mut sorted: Vec<(String, i64)> =
            members.iter().map(|(m, s)| (m.clone(), *s)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        sorted
    }
}

#[async_trait]
impl CounterCache for MemoryCounterCache {
    async fn incr_by(&self, key: &str, delta: i64, ttl: Option<Duration>) -> Result<i64> {
        let now = Instant::now();
        let mut entry = self.incr_entry(key, delta, now)?;
        if let Some(ttl) = ttl {
            entry.expires_at = Some(now + ttl);
        }
        let Value::Int(value) = entry.value else {
            return Err(wrong_type(key));
        };
        trace!("memory incr_by {} -> {}", key, value);
        Ok(value)
    }

    async fn incr_in_window(
        &self,
        key: &str,
        delta: i64,
        window: Duration,
    ) -> Result<WindowCount> {
        let now = Instant::now();
        let mut entry = self.incr_entry(key, delta, now)?;
        let Value::Int(count) = entry.value else {
            return Err(wrong_type(key));
        };
        if count == delta || entry.expires_at.is_none() {
            entry.expires_at = Some(now + window);
        }
        Ok(WindowCount {
            count,
            ttl_ms: entry.remaining_ms(now),
        })
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(now))
            .is_some()
        {
            trace!("memory key expired: {}", key);
            return Ok(None);
        }
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::Int(v) => Ok(Some(v.to_string())),
                Value::Text(s) => Ok(Some(s.clone())),
                Value::Ranked(_) => Err(wrong_type(key)),
            },
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.ensure_capacity(key)?;
        self.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn ranked_add(&self, key: &str, member: &str, score: i64) -> Result<()> {
        self.with_ranked(key, |members| {
            members
                .entry(member.to_string())
                .and_modify(|current| *current = (*current).max(score))
                .or_insert(score);
        })
    }

    async fn ranked_add_many(&self, key: &str, members: &[(String, i64)]) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }
        self.with_ranked(key, |set| {
            for (member, score) in members {
                set.insert(member.clone(), *score);
            }
        })
    }

    async fn ranked_rev_rank(&self, key: &str, member: &str) -> Result<Option<u64>> {
        let rank = self.read_ranked(key, |members| {
            Self::sorted_desc(members)
                .iter()
                .position(|(m, _)| m == member)
                .map(|pos| pos as u64)
        })?;
        Ok(rank.flatten())
    }

    async fn ranked_rev_range(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<(String, i64)>> {
        if start > stop {
            return Ok(Vec::new());
        }
        let range = self.read_ranked(key, |members| {
            Self::sorted_desc(members)
                .into_iter()
                .skip(start)
                .take(stop - start + 1)
                .collect::<Vec<_>>()
        })?;
        Ok(range.unwrap_or_default())
    }

    async fn ranked_len(&self, key: &str) -> Result<u64> {
        let len = self.read_ranked(key, |members| members.len() as u64)?;
        Ok(len.unwrap_or(0))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
