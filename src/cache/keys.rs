//! 缓存键命名

/// 快速路径全局点击计数（非权威）
pub const GLOBAL_CLICKS: &str = "metrics:global_clicks";
/// 最近一次观测到的限流窗口用量
pub const RATE_LIMIT_USAGE: &str = "metrics:rate_limit_usage";
/// ranked_set 模式下的排名索引
pub const RANK_INDEX: &str = "leaderboard:rank";
/// 排名索引最近一次从持久层对账的标记
pub const RANK_SYNCED: &str = "leaderboard:rank:synced";
/// 全局总点击数的缓存（来自持久层 SUM）
pub const GLOBAL_TOTAL: &str = "leaderboard:global_total";

pub fn rate_limit(user_id: &str) -> String {
    format!("rate_limit:{}", user_id)
}

pub fn user_total(user_id: &str) -> String {
    format!("user_total:{}", user_id)
}

pub fn leaderboard_top(n: usize) -> String {
    format!("leaderboard:top:{}", n)
}
