//! API 请求/响应类型
//!
//! 所有字段 camelCase；点击总数编码为十进制字符串，避免 JS 端精度丢失。

use serde::{Deserialize, Serialize};

use crate::clicks::{ClickReceipt, ClickWarning};
use crate::leaderboard::{LeaderboardEntry, LeaderboardView};
use crate::services::{SessionCounts, UserStats, UsernameCheck};
use crate::storage::User;

use super::error_code::ErrorCode;

/// 错误响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

// ============ 点击 ============

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClickRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickResponse {
    pub total_clicks: String,
    pub delta: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ClickWarning>,
}

impl From<ClickReceipt> for ClickResponse {
    fn from(receipt: ClickReceipt) -> Self {
        Self {
            total_clicks: receipt.total_clicks.to_string(),
            delta: receipt.delta,
            warnings: receipt.warnings,
        }
    }
}

// ============ 排行榜 ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryResponse {
    pub rank: u64,
    pub user_id: String,
    pub username: Option<String>,
    pub total_clicks: String,
}

impl From<LeaderboardEntry> for LeaderboardEntryResponse {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            rank: entry.rank,
            user_id: entry.user_id,
            username: entry.username,
            total_clicks: entry.total_clicks.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntryResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_rank: Option<LeaderboardEntryResponse>,
}

impl From<LeaderboardView> for LeaderboardResponse {
    fn from(view: LeaderboardView) -> Self {
        Self {
            entries: view.entries.into_iter().map(Into::into).collect(),
            viewer_rank: view.viewer_rank.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalTotalResponse {
    pub total_clicks: String,
}

// ============ 用户 ============

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUserRequest {
    pub id: String,
    pub display_name: Option<String>,
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub total_clicks: String,
    pub last_active_at: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u64>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            total_clicks: user.total_clicks.to_string(),
            last_active_at: user.last_active_at.map(|t| t.to_rfc3339()),
            created_at: user.created_at.to_rfc3339(),
            rank: None,
        }
    }
}

impl From<UserStats> for UserResponse {
    fn from(stats: UserStats) -> Self {
        let mut resp = UserResponse::from(stats.user);
        resp.rank = Some(stats.rank);
        resp
    }
}

// ============ 用户名 ============

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ValidateUsernameRequest {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetUsernameRequest {
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateUsernameResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<UsernameCheck> for ValidateUsernameResponse {
    fn from(check: UsernameCheck) -> Self {
        Self {
            valid: check.valid,
            message: check.message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUsernameResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<UsernameCheck> for SetUsernameResponse {
    fn from(check: UsernameCheck) -> Self {
        Self {
            success: check.valid,
            message: check.message,
        }
    }
}

// ============ 会话 ============

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HeartbeatRequest {
    pub user_id: String,
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TerminateRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCountsResponse {
    pub active: u64,
    pub inactive: u64,
}

impl From<SessionCounts> for SessionCountsResponse {
    fn from(counts: SessionCounts) -> Self {
        Self {
            active: counts.active,
            inactive: counts.inactive,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

// ============ 指标 ============

#[derive(Debug, Clone, Serialize)]
pub struct RateLimitUsageResponse {
    pub usage: i64,
}
