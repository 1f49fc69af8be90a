use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{Session, SessionStatus, User, UsernameUpdate};
use crate::errors::Result;

/// 用户与点击记录的持久层，唯一的权威数据源
///
/// 排名顺序：`total_clicks` 降序，`created_at` 升序，`id` 升序。
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<User>>;

    /// 首次接触时创建用户，否则刷新 `last_active_at`（以及给出的昵称）
    async fn create_or_touch_user(&self, id: &str, display_name: Option<&str>) -> Result<User>;

    /// 原子地给用户累计点击数加上 `delta` 并返回新值；用户不存在时返回 None
    async fn increment_user_total(&self, id: &str, delta: i64) -> Result<Option<i64>>;

    async fn append_click_event(&self, user_id: &str, delta: i64, total_after: i64)
    -> Result<()>;

    /// 按排名顺序取前 `limit` 名
    async fn top_users(&self, limit: usize) -> Result<Vec<User>>;

    async fn find_users(&self, ids: &[String]) -> Result<Vec<User>>;

    /// 排名严格在该用户之前的人数
    async fn count_users_above(&self, user: &User) -> Result<u64>;

    /// 所有用户累计点击数之和
    async fn sum_totals(&self) -> Result<i64>;

    /// 所有 (id, total_clicks)，用于重建排名索引
    async fn all_totals(&self) -> Result<Vec<(String, i64)>>;

    async fn count_click_events(&self, user_id: &str) -> Result<u64>;

    /// 用户名是否已被他人占用
    async fn username_taken(&self, username: &str) -> Result<bool>;

    async fn set_username(&self, user_id: &str, username: &str) -> Result<UsernameUpdate>;
}

/// 会话在线状态
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 找到 (user, chat) 的活跃会话并刷新心跳，没有则新建
    async fn open_or_touch_session(&self, user_id: &str, chat_id: &str) -> Result<Session>;

    /// 刷新用户活跃会话的心跳，`chat_id` 为 Some 时只刷新该聊天；返回受影响行数
    async fn heartbeat(&self, user_id: &str, chat_id: Option<&str>) -> Result<u64>;

    /// 终止用户所有活跃会话
    async fn terminate_sessions(&self, user_id: &str) -> Result<u64>;

    async fn count_sessions(&self, status: SessionStatus) -> Result<u64>;

    /// 把心跳早于 `cutoff` 的活跃会话标记为 INACTIVE
    async fn mark_stale_inactive(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}
