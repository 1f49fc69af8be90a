//! 排行榜
//!
//! 以持久层为准的 cache-aside 读取。缓存策略按部署选择：
//! `snapshot` 整体缓存前 N 名，`ranked_set` 维护一个有序集合索引。

mod service;

pub use service::{LeaderboardEntry, LeaderboardService, LeaderboardView, rank_order};
