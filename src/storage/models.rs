use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// 玩家
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub total_clicks: i64,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// 排行榜上展示的名字：优先自选用户名，其次平台昵称
    pub fn shown_name(&self) -> Option<&str> {
        self.username.as_deref().or(self.display_name.as_deref())
    }
}

/// 点击审计记录，只追加
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub id: i64,
    pub user_id: String,
    pub delta: i64,
    pub total_clicks: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Inactive,
    Terminated,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "ACTIVE",
            SessionStatus::Inactive => "INACTIVE",
            SessionStatus::Terminated => "TERMINATED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub user_id: String,
    pub chat_id: String,
    pub status: SessionStatus,
    pub last_heartbeat_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// 设置用户名的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsernameUpdate {
    Updated,
    Taken,
    UserNotFound,
}
