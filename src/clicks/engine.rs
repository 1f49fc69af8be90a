use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use super::rate_limiter::{RateDecision, RateLimiter};
use crate::cache::{CounterCache, keys};
use crate::config::{ClicksConfig, LeaderboardPolicy};
use crate::errors::{ClickerError, Result};
use crate::storage::UserStore;

/// 点击已被接受但某个非关键步骤失败
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum ClickWarning {
    /// 快速路径计数未更新
    CacheDegraded(String),
    /// 累计数已增加，但审计记录未写入
    AuditLogFailed(String),
    /// 排名索引未更新，下次对账时修复
    LeaderboardHintFailed(String),
}

/// 一次被接受的点击
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickReceipt {
    /// 持久层给出的权威累计数
    pub total_clicks: i64,
    pub delta: i64,
    pub warnings: Vec<ClickWarning>,
}

impl ClickReceipt {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// 点击计数引擎
///
/// 流程：限流 → 快速路径计数 → 持久层原子自增 → 审计记录 → 排行榜提示。
/// 持久层是唯一的权威数据源；缓存失败只会产生警告。
#[derive(Clone)]
pub struct ClickEngine {
    store: Arc<dyn UserStore>,
    cache: Arc<dyn CounterCache>,
    limiter: RateLimiter,
    increment: i64,
    user_total_ttl: Duration,
    policy: LeaderboardPolicy,
}

impl ClickEngine {
    pub fn new(
        store: Arc<dyn UserStore>,
        cache: Arc<dyn CounterCache>,
        config: &ClicksConfig,
        policy: LeaderboardPolicy,
    ) -> Self {
        let limiter = RateLimiter::from_config(cache.clone(), config);
        let user_total_ttl =
            limiter.window() * config.user_total_ttl_multiplier.max(1);
        Self {
            store,
            cache,
            limiter,
            increment: config.increment.max(1),
            user_total_ttl,
            policy,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub async fn register_click(&self, user_id: &str) -> Result<ClickReceipt> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ClickerError::validation("userId must not be empty"));
        }

        if let RateDecision::Denied { retry_after_ms } =
            self.limiter.check_and_consume(user_id).await
        {
            return Err(ClickerError::rate_limited(retry_after_ms));
        }

        let delta = self.increment;
        let mut warnings = Vec::new();

        self.bump_fast_counters(user_id, delta, &mut warnings).await;

        // 不在这里重试：自增不是幂等的
        let total_clicks = self
            .store
            .increment_user_total(user_id, delta)
            .await?
            .ok_or_else(|| ClickerError::user_not_found(user_id))?;

        if let Err(e) = self
            .store
            .append_click_event(user_id, delta, total_clicks)
            .await
        {
            warn!(
                "Click event for {} (total {}) not recorded: {}",
                user_id, total_clicks, e
            );
            warnings.push(ClickWarning::AuditLogFailed(e.message()));
        }

        if self.policy == LeaderboardPolicy::RankedSet
            && let Err(e) = self
                .cache
                .ranked_add(keys::RANK_INDEX, user_id, total_clicks)
                .await
        {
            warn!("Rank index update failed for {}: {}", user_id, e);
            warnings.push(ClickWarning::LeaderboardHintFailed(e.message()));
        }

        debug!("Click accepted for {}: total {}", user_id, total_clicks);
        Ok(ClickReceipt {
            total_clicks,
            delta,
            warnings,
        })
    }

    async fn bump_fast_counters(&self, user_id: &str, delta: i64, warnings: &mut Vec<ClickWarning>) {
        let user_key = keys::user_total(user_id);
        let (user_total, global) = tokio::join!(
            self.cache.incr_by(&user_key, delta, Some(self.user_total_ttl)),
            self.cache.incr_by(keys::GLOBAL_CLICKS, delta, None),
        );

        for result in [user_total, global] {
            if let Err(e) = result {
                warn!("Fast-path counter update failed for {}: {}", user_id, e);
                warnings.push(ClickWarning::CacheDegraded(e.message()));
            }
        }
    }
}
