use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use crate::cache::traits::{CounterCache, WindowCount};
use crate::config::CacheConfig;
use crate::declare_counter_cache_plugin;
use crate::errors::{ClickerError, Result};

declare_counter_cache_plugin!("redis", RedisCounterCache);

pub struct RedisCounterCache {
    client: redis::Client,
    /// 持久化连接，使用 RwLock 保护
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    key_prefix: String,
}

impl RedisCounterCache {
    pub fn new(url: &str, key_prefix: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            ClickerError::cache_connection(format!("Invalid Redis URL '{}': {}", url, e))
        })?;

        debug!("RedisCounterCache created with prefix: '{}'", key_prefix);

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            key_prefix: key_prefix.to_string(),
        })
    }

    /// 创建并测试连接，启动时 Redis 不可达视为配置错误
    pub async fn from_config(config: &CacheConfig) -> Result<Self> {
        let cache = Self::new(&config.redis.url, &config.redis.key_prefix)?;
        cache.ping().await.map_err(|e| {
            ClickerError::cache_connection(format!(
                "Failed to ping Redis server at {}: {}",
                config.redis.url,
                e.message()
            ))
        })?;
        debug!("Redis connection test successful");
        Ok(cache)
    }

    /// 获取或建立持久连接
    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // 双重检查，避免竞态条件
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        match self.client.get_multiplexed_async_connection().await {
            Ok(new_conn) => {
                *conn_guard = Some(new_conn.clone());
                debug!("Redis connection established and cached");
                Ok(new_conn)
            }
            Err(e) => {
                warn!("Failed to get Redis connection: {}", e);
                Err(e.into())
            }
        }
    }

    /// 重置连接（在连接错误时调用）
    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    /// 统一处理命令结果，连接类错误时丢弃缓存的连接
    async fn finish<T>(&self, op: &str, key: &str, result: redis::RedisResult<T>) -> Result<T> {
        match result {
            Ok(value) => {
                trace!("redis {} ok: {}", op, key);
                Ok(value)
            }
            Err(e) => {
                warn!("redis {} failed for key '{}': {}", op, key, e);
                if e.is_connection_dropped() || e.is_io_error() || e.is_timeout() {
                    self.reset_connection().await;
                }
                Err(e.into())
            }
        }
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

fn millis(d: Duration) -> u64 {
    (d.as_millis() as u64).max(1)
}

#[async_trait]
impl CounterCache for RedisCounterCache {
    async fn incr_by(&self, key: &str, delta: i64, ttl: Option<Duration>) -> Result<i64> {
        let redis_key = self.make_key(key);
        let mut conn = self.get_connection().await?;

        let result = match ttl {
            Some(ttl) => redis::pipe()
                .atomic()
                .cmd("INCRBY")
                .arg(&redis_key)
                .arg(delta)
                .cmd("PEXPIRE")
                .arg(&redis_key)
                .arg(millis(ttl))
                .ignore()
                .query_async::<(i64,)>(&mut conn)
                .await
                .map(|(v,)| v),
            None => {
                redis::cmd("INCRBY")
                    .arg(&redis_key)
                    .arg(delta)
                    .query_async::<i64>(&mut conn)
                    .await
            }
        };
        self.finish("INCRBY", key, result).await
    }

    async fn incr_in_window(
        &self,
        key: &str,
        delta: i64,
        window: Duration,
    ) -> Result<WindowCount> {
        let redis_key = self.make_key(key);
        let mut conn = self.get_connection().await?;

        // INCRBY 与 PTTL 在同一个 MULTI 中，一次往返
        let result = redis::pipe()
            .atomic()
            .cmd("INCRBY")
            .arg(&redis_key)
            .arg(delta)
            .cmd("PTTL")
            .arg(&redis_key)
            .query_async::<(i64, i64)>(&mut conn)
            .await;
        let (count, pttl) = self.finish("INCRBY+PTTL", key, result).await?;

        // PTTL: -1 无过期时间, -2 键不存在
        if count == delta || pttl < 0 {
            let window_ms = millis(window);
            let result = redis::cmd("PEXPIRE")
                .arg(&redis_key)
                .arg(window_ms)
                .query_async::<i64>(&mut conn)
                .await;
            self.finish("PEXPIRE", key, result).await?;
            return Ok(WindowCount {
                count,
                ttl_ms: Some(window_ms),
            });
        }

        Ok(WindowCount {
            count,
            ttl_ms: Some(pttl as u64),
        })
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let redis_key = self.make_key(key);
        let mut conn = self.get_connection().await?;
        let result = redis::cmd("GET")
            .arg(&redis_key)
            .query_async::<Option<String>>(&mut conn)
            .await;
        self.finish("GET", key, result).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let redis_key = self.make_key(key);
        let mut conn = self.get_connection().await?;
        let result = redis::cmd("SET")
            .arg(&redis_key)
            .arg(value)
            .arg("PX")
            .arg(millis(ttl))
            .query_async::<()>(&mut conn)
            .await;
        self.finish("SET", key, result).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let redis_key = self.make_key(key);
        let mut conn = self.get_connection().await?;
        let result = redis::cmd("DEL")
            .arg(&redis_key)
            .query_async::<()>(&mut conn)
            .await;
        self.finish("DEL", key, result).await
    }

    async fn ranked_add(&self, key: &str, member: &str, score: i64) -> Result<()> {
        let redis_key = self.make_key(key);
        let mut conn = self.get_connection().await?;
        let result = redis::cmd("ZADD")
            .arg(&redis_key)
            .arg("GT")
            .arg(score)
            .arg(member)
            .query_async::<()>(&mut conn)
            .await;
        self.finish("ZADD", key, result).await
    }

    async fn ranked_add_many(&self, key: &str, members: &[(String, i64)]) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }
        let redis_key = self.make_key(key);
        let mut conn = self.get_connection().await?;

        let mut cmd = redis::cmd("ZADD");
        cmd.arg(&redis_key);
        for (member, score) in members {
            cmd.arg(*score).arg(member);
        }
        let result = cmd.query_async::<()>(&mut conn).await;
        self.finish("ZADD", key, result).await
    }

    async fn ranked_rev_rank(&self, key: &str, member: &str) -> Result<Option<u64>> {
        let redis_key = self.make_key(key);
        let mut conn = self.get_connection().await?;
        let result = redis::cmd("ZREVRANK")
            .arg(&redis_key)
            .arg(member)
            .query_async::<Option<u64>>(&mut conn)
            .await;
        self.finish("ZREVRANK", key, result).await
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
        let redis_key = self.make_key(key);
        let mut conn = self.get_connection().await?;
        let result = redis::cmd("ZREVRANGE")
            .arg(&redis_key)
            .arg(start)
            .arg(stop)
            .arg("WITHSCORES")
            .query_async::<Vec<(String, f64)>>(&mut conn)
            .await;
        let members = self.finish("ZREVRANGE", key, result).await?;
        // 分数只用于挑选候选，权威值以持久层为准
        Ok(members
            .into_iter()
            .map(|(member, score)| (member, score as i64))
            .collect())
    }

    async fn ranked_len(&self, key: &str) -> Result<u64> {
        let redis_key = self.make_key(key);
        let mut conn = self.get_connection().await?;
        let result = redis::cmd("ZCARD")
            .arg(&redis_key)
            .query_async::<u64>(&mut conn)
            .await;
        self.finish("ZCARD", key, result).await
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let result = redis::cmd("PING").query_async::<String>(&mut conn).await;
        self.finish("PING", "", result).await.map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_key_applies_prefix() {
        let cache = RedisCounterCache::new("redis://127.0.0.1:6379/", "clicker:").unwrap();
        assert_eq!(cache.make_key("rate_limit:u1"), "clicker:rate_limit:u1");
    }

    #[test]
    fn test_invalid_url_is_connection_error() {
        let err = match RedisCounterCache::new("not a url", "p:") {
            Ok(_) => panic!("invalid url must fail"),
            Err(e) => e,
        };
        assert!(matches!(err, ClickerError::CacheConnection(_)));
    }

    #[test]
    fn test_millis_never_zero() {
        assert_eq!(millis(Duration::from_micros(10)), 1);
        assert_eq!(millis(Duration::from_secs(2)), 2_000);
    }
}
