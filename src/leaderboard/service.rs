use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::cache::{CounterCache, keys};
use crate::config::{LeaderboardConfig, LeaderboardPolicy};
use crate::errors::Result;
use crate::storage::{User, UserStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u64,
    pub user_id: String,
    pub username: Option<String>,
    pub total_clicks: i64,
}

impl LeaderboardEntry {
    fn from_user(rank: u64, user: &User) -> Self {
        Self {
            rank,
            user_id: user.id.clone(),
            username: user.shown_name().map(str::to_string),
            total_clicks: user.total_clicks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardView {
    pub entries: Vec<LeaderboardEntry>,
    /// 查看者自己的排名，未指定或用户不存在时为 None
    pub viewer_rank: Option<LeaderboardEntry>,
}

/// 排名顺序：总数降序，创建时间升序，id 升序
pub fn rank_order(a: &User, b: &User) -> Ordering {
    b.total_clicks
        .cmp(&a.total_clicks)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Clone)]
pub struct LeaderboardService {
    store: Arc<dyn UserStore>,
    cache: Arc<dyn CounterCache>,
    config: LeaderboardConfig,
}

impl LeaderboardService {
    pub fn new(
        store: Arc<dyn UserStore>,
        cache: Arc<dyn CounterCache>,
        config: &LeaderboardConfig,
    ) -> Self {
        Self {
            store,
            cache,
            config: config.clone(),
        }
    }

    pub fn policy(&self) -> LeaderboardPolicy {
        self.config.policy
    }

    pub fn default_limit(&self) -> usize {
        self.config.default_limit
    }

    /// 把请求的条数限制在 `1..=max_limit`
    pub fn clamp_limit(&self, n: usize) -> usize {
        n.clamp(1, self.config.max_limit.max(1))
    }

    pub async fn top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>> {
        let n = self.clamp_limit(n);
        match self.config.policy {
            LeaderboardPolicy::Snapshot => self.snapshot_top_n(n).await,
            LeaderboardPolicy::RankedSet => self.ranked_top_n(n).await,
        }
    }

    pub async fn leaderboard(&self, n: usize, viewer: Option<&str>) -> Result<LeaderboardView> {
        match viewer {
            Some(user_id) => self.top_n_with_user(n, user_id).await,
            None => Ok(LeaderboardView {
                entries: self.top_n(n).await?,
                viewer_rank: None,
            }),
        }
    }

    /// 前 N 名以及查看者的真实排名；查看者不在前 N 名时不改动 entries
    pub async fn top_n_with_user(&self, n: usize, user_id: &str) -> Result<LeaderboardView> {
        let entries = self.top_n(n).await?;

        let viewer_rank = match entries.iter().find(|e| e.user_id == user_id) {
            Some(entry) => Some(entry.clone()),
            None => self.rank_of(user_id).await?,
        };

        Ok(LeaderboardView {
            entries,
            viewer_rank,
        })
    }

    /// 直接从持久层计算某个用户的排名
    pub async fn rank_of(&self, user_id: &str) -> Result<Option<LeaderboardEntry>> {
        let Some(user) = self.store.find_user(user_id).await? else {
            return Ok(None);
        };
        let ahead = self.store.count_users_above(&user).await?;
        Ok(Some(LeaderboardEntry::from_user(ahead + 1, &user)))
    }

    /// 所有用户累计数之和，缓存 `global_total_ttl_secs` 秒
    pub async fn global_total(&self) -> Result<i64> {
        match self.cache.get(keys::GLOBAL_TOTAL).await {
            Ok(Some(cached)) => match cached.parse::<i64>() {
                Ok(total) => return Ok(total),
                Err(_) => warn!("Discarding unparsable global total cache: {:?}", cached),
            },
            Ok(None) => {}
            Err(e) => warn!("Global total cache read failed: {}", e),
        }

        let total = self.store.sum_totals().await?;
        let ttl = Duration::from_secs(self.config.global_total_ttl_secs.max(1));
        if let Err(e) = self
            .cache
            .set_ex(keys::GLOBAL_TOTAL, &total.to_string(), ttl)
            .await
        {
            warn!("Global total cache write failed: {}", e);
        }
        Ok(total)
    }

    /// 用持久层的数据整体重建排名索引
    pub async fn rebuild_rank_index(&self) -> Result<usize> {
        let totals = self.store.all_totals().await?;
        self.cache.ranked_add_many(keys::RANK_INDEX, &totals).await?;
        let ttl = Duration::from_secs(self.config.rank_resync_secs.max(1));
        self.cache.set_ex(keys::RANK_SYNCED, "1", ttl).await?;
        info!("Rank index rebuilt with {} users", totals.len());
        Ok(totals.len())
    }

    async fn store_top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>> {
        let users = self.store.top_users(n).await?;
        Ok(users
            .iter()
            .enumerate()
            .map(|(i, user)| LeaderboardEntry::from_user(i as u64 + 1, user))
            .collect())
    }

    async fn snapshot_top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>> {
        let key = keys::leaderboard_top(n);
        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<LeaderboardEntry>>(&raw) {
                Ok(entries) => {
                    trace!("Leaderboard snapshot hit: {}", key);
                    return Ok(entries);
                }
                Err(e) => warn!("Leaderboard snapshot {} undecodable, recomputing: {}", key, e),
            },
            Ok(None) => {}
            Err(e) => warn!("Leaderboard snapshot read failed, using store: {}", e),
        }

        let entries = self.store_top_n(n).await?;
        let ttl = Duration::from_secs(self.config.snapshot_ttl_secs.max(1));
        match serde_json::to_string(&entries) {
            Ok(raw) => {
                if let Err(e) = self.cache.set_ex(&key, &raw, ttl).await {
                    warn!("Leaderboard snapshot write failed: {}", e);
                }
            }
            Err(e) => warn!("Leaderboard snapshot encode failed: {}", e),
        }
        Ok(entries)
    }

    async fn ranked_top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>> {
        match self.ranked_candidates(n).await {
            Ok(candidates) if !candidates.is_empty() => {
                let mut users = self.store.find_users(&candidates).await?;
                if !users.is_empty() {
                    // 分数只用来挑候选，顺序和数值以持久层为准
                    users.sort_by(rank_order);
                    users.truncate(n);
                    return Ok(users
                        .iter()
                        .enumerate()
                        .map(|(i, user)| LeaderboardEntry::from_user(i as u64 + 1, user))
                        .collect());
                }
                debug!("Rank index candidates unknown to store, using store");
            }
            Ok(_) => debug!("Rank index empty, using store"),
            Err(e) => warn!("Rank index unavailable, using store: {}", e),
        }
        self.store_top_n(n).await
    }

    /// 从排名索引取候选 id；多取一倍用于吸收同分和过期分数造成的顺序差异
    async fn ranked_candidates(&self, n: usize) -> Result<Vec<String>> {
        if self.cache.get(keys::RANK_SYNCED).await?.is_none() {
            self.rebuild_rank_index().await?;
        }
        let fetch = n.saturating_mul(2).max(1);
        let members = self
            .cache
            .ranked_rev_range(keys::RANK_INDEX, 0, fetch - 1)
            .await?;
        let mut seen = HashSet::new();
        Ok(members
            .into_iter()
            .map(|(member, _)| member)
            .filter(|member| seen.insert(member.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    fn user(id: &str, total: i64, offset_secs: i64) -> User {
        User {
            id: id.to_string(),
            username: None,
            display_name: None,
            total_clicks: total,
            last_active_at: None,
            created_at: Utc::now() + ChronoDuration::seconds(offset_secs),
        }
    }

    #[test]
    fn test_rank_order_tie_break() {
        let mut users = vec![
            user("b", 5, 0),
            user("a", 5, 0),
            user("c", 9, 10),
            user("d", 5, -10),
        ];
        let base = users[0].created_at;
        users[1].created_at = base;
        users.sort_by(rank_order);
        let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d", "a", "b"]);
    }
}
