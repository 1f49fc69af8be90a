use std::time::Duration;

use async_trait::async_trait;

use crate::errors::Result;

/// 固定窗口计数的一次观测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    /// 自增后的计数
    pub count: i64,
    /// 当前窗口剩余毫秒数，未知时为 None
    pub ttl_ms: Option<u64>,
}

/// 快速计数缓存
///
/// 所有整数操作都必须是原子的：并发的 `incr_by` 不会丢失增量。
/// 缓存内容可随时丢失，调用方需要能从持久层重建。
#[async_trait]
pub trait CounterCache: Send + Sync {
    /// 原子自增；`ttl` 为 Some 时同时刷新过期时间
    async fn incr_by(&self, key: &str, delta: i64, ttl: Option<Duration>) -> Result<i64>;

    /// 窗口计数：自增并读取剩余 TTL，窗口首次命中或无过期时间时设置为 `window`
    async fn incr_in_window(&self, key: &str, delta: i64, window: Duration)
    -> Result<WindowCount>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// 有序集合写入，已有成员只在新分数更高时更新
    async fn ranked_add(&self, key: &str, member: &str, score: i64) -> Result<()>;

    /// 批量写入，直接覆盖已有分数
    async fn ranked_add_many(&self, key: &str, members: &[(String, i64)]) -> Result<()>;

    /// 按分数降序的 0 基排名
    async fn ranked_rev_rank(&self, key: &str, member: &str) -> Result<Option<u64>>;

    /// 按分数降序取 `[start, stop]` 区间（闭区间）
    async fn ranked_rev_range(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<(String, i64)>>;

    async fn ranked_len(&self, key: &str) -> Result<u64>;

    async fn ping(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}
