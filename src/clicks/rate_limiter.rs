use std::sync::Arc;
use std::time::Duration;

use tracing::{trace, warn};

use crate::cache::{CounterCache, keys};
use crate::config::ClicksConfig;

/// 限流判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied { retry_after_ms: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

/// 固定窗口限流器
///
/// 窗口从用户在该窗口内的第一次操作开始计时。跨越窗口边界时用户最多能在
/// 很短时间内完成 2 × `max_actions` 次操作。
///
/// 缓存不可用时放行（fail open），限流永远不会让点击因基础设施故障失败。
#[derive(Clone)]
pub struct RateLimiter {
    cache: Arc<dyn CounterCache>,
    window: Duration,
    max_actions: u64,
}

impl RateLimiter {
    pub fn new(cache: Arc<dyn CounterCache>, window: Duration, max_actions: u64) -> Self {
        Self {
            cache,
            window,
            max_actions,
        }
    }

    pub fn from_config(cache: Arc<dyn CounterCache>, config: &ClicksConfig) -> Self {
        Self::new(
            cache,
            Duration::from_millis(config.rate_limit_window_ms),
            config.max_actions,
        )
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_actions(&self) -> u64 {
        self.max_actions
    }

    /// 计入一次操作并判定是否放行
    pub async fn check_and_consume(&self, user_id: &str) -> RateDecision {
        let key = keys::rate_limit(user_id);
        let observed = match self.cache.incr_in_window(&key, 1, self.window).await {
            Ok(observed) => observed,
            Err(e) => {
                warn!(
                    "Rate limiter degraded, allowing click for {}: {}",
                    user_id, e
                );
                return RateDecision::Allowed;
            }
        };

        self.publish_usage(observed.count);

        if observed.count > self.max_actions as i64 {
            let retry_after_ms = observed
                .ttl_ms
                .filter(|ttl| *ttl > 0)
                .unwrap_or(self.window.as_millis() as u64);
            trace!(
                "Rate limit hit for {}: {} actions, retry after {} ms",
                user_id, observed.count, retry_after_ms
            );
            return RateDecision::Denied { retry_after_ms };
        }

        RateDecision::Allowed
    }

    /// 用量指标写入不在请求路径上，失败只记日志
    fn publish_usage(&self, count: i64) {
        let cache = self.cache.clone();
        let ttl = Duration::from_secs(self.window.as_millis().div_ceil(1000).max(1) as u64);
        tokio::spawn(async move {
            if let Err(e) = cache
                .set_ex(keys::RATE_LIMIT_USAGE, &count.to_string(), ttl)
                .await
            {
                warn!("Failed to publish rate limit usage: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCounterCache;

    fn limiter(max_actions: u64) -> (Arc<MemoryCounterCache>, RateLimiter) {
        let cache = Arc::new(MemoryCounterCache::new(1_000));
        let limiter = RateLimiter::new(cache.clone(), Duration::from_millis(1_000), max_actions);
        (cache, limiter)
    }

    #[tokio::test(start_paused = true)]
    async fn test_denies_after_max_actions_within_window() {
        let (_, limiter) = limiter(3);
        for _ in 0..3 {
            assert!(limiter.check_and_consume("u1").await.is_allowed());
        }
        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(
            limiter.check_and_consume("u1").await,
            RateDecision::Denied {
                retry_after_ms: 750
            }
        );
        // 其他用户不受影响
        assert!(limiter.check_and_consume("u2").await.is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_allows_again_after_window() {
        let (_, limiter) = limiter(1);
        assert!(limiter.check_and_consume("u1").await.is_allowed());
        assert!(!limiter.check_and_consume("u1").await.is_allowed());
        tokio::time::advance(Duration::from_millis(1_001)).await;
        assert!(limiter.check_and_consume("u1").await.is_allowed());
    }

    #[tokio::test]
    async fn test_publishes_usage() {
        let (cache, limiter) = limiter(10);
        limiter.check_and_consume("u1").await;
        limiter.check_and_consume("u1").await;

        let mut usage = None;
        for _ in 0..50 {
            tokio::task::yield_now().await;
            usage = cache.get(keys::RATE_LIMIT_USAGE).await.unwrap();
            if usage.as_deref() == Some("2") {
                break;
            }
        }
        assert_eq!(usage.as_deref(), Some("2"));
    }
}
