use std::str::FromStr;

use tracing::warn;

use crate::storage::models::{Session, SessionStatus, User};
use migration::entities::{session, user};

pub fn model_to_user(model: user::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        display_name: model.display_name,
        total_clicks: model.total_clicks,
        last_active_at: model.last_active_at,
        created_at: model.created_at,
    }
}

/// 未知状态按 INACTIVE 处理，避免一条脏数据让整个查询失败
pub fn model_to_session(model: session::Model) -> Session {
    let status = SessionStatus::from_str(&model.status).unwrap_or_else(|_| {
        warn!(
            "Unknown session status '{}' for session {}",
            model.status, model.id
        );
        SessionStatus::Inactive
    });
    Session {
        id: model.id,
        user_id: model.user_id,
        chat_id: model.chat_id,
        status,
        last_heartbeat_at: model.last_heartbeat_at,
        created_at: model.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_unknown_session_status_falls_back() {
        let model = session::Model {
            id: 1,
            user_id: "u1".into(),
            chat_id: "c1".into(),
            status: "PAUSED".into(),
            last_heartbeat_at: Utc::now(),
            created_at: Utc::now(),
        };
        assert_eq!(model_to_session(model).status, SessionStatus::Inactive);
    }

    #[test]
    fn test_model_to_user_keeps_totals() {
        let model = user::Model {
            id: "42".into(),
            username: None,
            display_name: Some("Ann".into()),
            total_clicks: 9_007_199_254_740_993,
            last_active_at: None,
            created_at: Utc::now(),
        };
        let user = model_to_user(model);
        assert_eq!(user.total_clicks, 9_007_199_254_740_993);
        assert_eq!(user.shown_name(), Some("Ann"));
    }
}
