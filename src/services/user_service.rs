//! 用户身份：首次接触建档、资料与排名查询

use std::sync::Arc;

use tracing::debug;

use crate::errors::{ClickerError, Result};
use crate::storage::{SessionStore, User, UserStore};

/// 用户资料加上当前排名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub user: User,
    pub rank: u64,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { users, sessions }
    }

    /// 记录一次接触：创建或刷新用户，给出 chat_id 时同时打开/刷新会话
    pub async fn register_contact(
        &self,
        user_id: &str,
        display_name: Option<&str>,
        chat_id: Option<&str>,
    ) -> Result<User> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ClickerError::validation("id must not be empty"));
        }
        let display_name = display_name.map(str::trim).filter(|n| !n.is_empty());

        let user = self.users.create_or_touch_user(user_id, display_name).await?;
        if let Some(chat_id) = chat_id.filter(|c| !c.is_empty()) {
            let session = self.sessions.open_or_touch_session(&user.id, chat_id).await?;
            debug!("Session {} active for user {}", session.id, user.id);
        }
        Ok(user)
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<UserStats> {
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| ClickerError::user_not_found(user_id))?;
        let rank = self.users.count_users_above(&user).await? + 1;
        Ok(UserStats { user, rank })
    }
}
