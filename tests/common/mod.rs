//! 集成测试共用的夹具：临时 SQLite、可注入故障的内存存储与故障缓存
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::TempDir;

use clicker::cache::{CounterCache, WindowCount};
use clicker::config::{ClicksConfig, DatabaseConfig, LeaderboardConfig};
use clicker::errors::{ClickerError, Result};
use clicker::leaderboard::rank_order;
use clicker::storage::backend::SeaOrmStorage;
use clicker::storage::{ClickEvent, User, UserStore, UsernameUpdate};

/// 创建临时 SQLite 数据库的存储实例
pub async fn temp_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("clicker_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite", &DatabaseConfig::default())
        .await
        .expect("Failed to create storage");

    (Arc::new(storage), temp_dir)
}

/// 宽松的限流配置，避免并发测试被限流
pub fn relaxed_clicks() -> ClicksConfig {
    ClicksConfig {
        max_actions: 10_000,
        ..ClicksConfig::default()
    }
}

pub fn leaderboard_config() -> LeaderboardConfig {
    LeaderboardConfig::default()
}

/// 内存版 UserStore，可以让审计写入或全部调用失败
#[derive(Default)]
pub struct MockStore {
    users: Mutex<HashMap<String, User>>,
    events: Mutex<Vec<ClickEvent>>,
    pub fail_append: AtomicBool,
    pub fail_all: AtomicBool,
    pub increment_calls: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, id: &str, total: i64) -> Self {
        self.insert(id, total, Utc::now());
        self
    }

    pub fn insert(&self, id: &str, total: i64, created_at: DateTime<Utc>) {
        self.users.lock().unwrap().insert(
            id.to_string(),
            User {
                id: id.to_string(),
                username: None,
                display_name: None,
                total_clicks: total,
                last_active_at: None,
                created_at,
            },
        );
    }

    /// 绕过引擎直接改数据库里的总数
    pub fn set_total(&self, id: &str, total: i64) {
        if let Some(user) = self.users.lock().unwrap().get_mut(id) {
            user.total_clicks = total;
        }
    }

    pub fn total_of(&self, id: &str) -> Option<i64> {
        self.users.lock().unwrap().get(id).map(|u| u.total_clicks)
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    fn check(&self) -> Result<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(ClickerError::store_unavailable("store is down"));
        }
        Ok(())
    }

    fn sorted(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by(rank_order);
        users
    }
}

#[async_trait]
impl UserStore for MockStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        self.check()?;
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn create_or_touch_user(&self, id: &str, display_name: Option<&str>) -> Result<User> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let now = Utc::now();
        let user = users.entry(id.to_string()).or_insert_with(|| User {
            id: id.to_string(),
            username: None,
            display_name: None,
            total_clicks: 0,
            last_active_at: None,
            created_at: now,
        });
        user.last_active_at = Some(now);
        if let Some(name) = display_name {
            user.display_name = Some(name.to_string());
        }
        Ok(user.clone())
    }

    async fn increment_user_total(&self, id: &str, delta: i64) -> Result<Option<i64>> {
        self.check()?;
        self.increment_calls.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        Ok(users.get_mut(id).map(|user| {
            user.total_clicks += delta;
            user.last_active_at = Some(Utc::now());
            user.total_clicks
        }))
    }

    async fn append_click_event(&self, user_id: &str, delta: i64, total_after: i64) -> Result<()> {
        self.check()?;
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(ClickerError::store_unavailable("audit table locked"));
        }
        let mut events = self.events.lock().unwrap();
        let id = events.len() as i64 + 1;
        events.push(ClickEvent {
            id,
            user_id: user_id.to_string(),
            delta,
            total_clicks: total_after,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn top_users(&self, limit: usize) -> Result<Vec<User>> {
        self.check()?;
        let mut users = self.sorted();
        users.truncate(limit);
        Ok(users)
    }

    async fn find_users(&self, ids: &[String]) -> Result<Vec<User>> {
        self.check()?;
        let users = self.users.lock().unwrap();
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn count_users_above(&self, user: &User) -> Result<u64> {
        self.check()?;
        Ok(self
            .sorted()
            .iter()
            .take_while(|u| u.id != user.id)
            .filter(|u| rank_order(u, user) == std::cmp::Ordering::Less)
            .count() as u64)
    }

    async fn sum_totals(&self) -> Result<i64> {
        self.check()?;
        Ok(self.users.lock().unwrap().values().map(|u| u.total_clicks).sum())
    }

    async fn all_totals(&self) -> Result<Vec<(String, i64)>> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .map(|u| (u.id.clone(), u.total_clicks))
            .collect())
    }

    async fn count_click_events(&self, user_id: &str) -> Result<u64> {
        self.check()?;
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .count() as u64)
    }

    async fn username_taken(&self, username: &str) -> Result<bool> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .any(|u| u.username.as_deref() == Some(username)))
    }

    async fn set_username(&self, user_id: &str, username: &str) -> Result<UsernameUpdate> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.id != user_id && u.username.as_deref() == Some(username))
        {
            return Ok(UsernameUpdate::Taken);
        }
        match users.get_mut(user_id) {
            Some(user) => {
                user.username = Some(username.to_string());
                Ok(UsernameUpdate::Updated)
            }
            None => Ok(UsernameUpdate::UserNotFound),
        }
    }
}

/// 所有操作都失败的缓存，模拟 Redis 宕机
#[derive(Default)]
pub struct DownCache {
    pub calls: AtomicUsize,
}

impl DownCache {
    fn fail<T>(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ClickerError::cache_unavailable("connection refused"))
    }
}

#[async_trait]
impl CounterCache for DownCache {
    async fn incr_by(&self, _key: &str, _delta: i64, _ttl: Option<Duration>) -> Result<i64> {
        self.fail()
    }

    async fn incr_in_window(
        &self,
        _key: &str,
        _delta: i64,
        _window: Duration,
    ) -> Result<WindowCount> {
        self.fail()
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        self.fail()
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        self.fail()
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        self.fail()
    }

    async fn ranked_add(&self, _key: &str, _member: &str, _score: i64) -> Result<()> {
        self.fail()
    }

    async fn ranked_add_many(&self, _key: &str, _members: &[(String, i64)]) -> Result<()> {
        self.fail()
    }

    async fn ranked_rev_rank(&self, _key: &str, _member: &str) -> Result<Option<u64>> {
        self.fail()
    }

    async fn ranked_rev_range(
        &self,
        _key: &str,
        _start: usize,
        _stop: usize,
    ) -> Result<Vec<(String, i64)>> {
        self.fail()
    }

    async fn ranked_len(&self, _key: &str) -> Result<u64> {
        self.fail()
    }

    async fn ping(&self) -> Result<()> {
        self.fail()
    }

    fn backend_name(&self) -> &'static str {
        "down"
    }
}
