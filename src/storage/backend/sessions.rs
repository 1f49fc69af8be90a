//! `SessionStore` 实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use tracing::debug;

use super::SeaOrmStorage;
use super::converters::model_to_session;
use super::retry;
use crate::errors::Result;
use crate::storage::models::{Session, SessionStatus};
use crate::storage::traits::SessionStore;

use migration::entities::session;

#[async_trait]
impl SessionStore for SeaOrmStorage {
    async fn open_or_touch_session(&self, user_id: &str, chat_id: &str) -> Result<Session> {
        let now = Utc::now();
        let existing = session::Entity::find()
            .filter(session::Column::UserId.eq(user_id))
            .filter(session::Column::ChatId.eq(chat_id))
            .filter(session::Column::Status.eq(SessionStatus::Active.as_str()))
            .order_by_desc(session::Column::Id)
            .one(&self.db)
            .await?;

        let model = match existing {
            Some(model) => {
                let mut active: session::ActiveModel = model.into();
                active.last_heartbeat_at = Set(now);
                active.update(&self.db).await?
            }
            None => {
                debug!("Opening session for user {} in chat {}", user_id, chat_id);
                session::ActiveModel {
                    user_id: Set(user_id.to_string()),
                    chat_id: Set(chat_id.to_string()),
                    status: Set(SessionStatus::Active.to_string()),
                    last_heartbeat_at: Set(now),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.db)
                .await?
            }
        };
        Ok(model_to_session(model))
    }

    async fn heartbeat(&self, user_id: &str, chat_id: Option<&str>) -> Result<u64> {
        let mut query = session::Entity::update_many()
            .col_expr(session::Column::LastHeartbeatAt, Expr::value(Utc::now()))
            .filter(session::Column::UserId.eq(user_id))
            .filter(session::Column::Status.eq(SessionStatus::Active.as_str()));
        if let Some(chat_id) = chat_id {
            query = query.filter(session::Column::ChatId.eq(chat_id));
        }
        Ok(query.exec(&self.db).await?.rows_affected)
    }

    async fn terminate_sessions(&self, user_id: &str) -> Result<u64> {
        let result = session::Entity::update_many()
            .col_expr(
                session::Column::Status,
                Expr::value(SessionStatus::Terminated.as_str()),
            )
            .filter(session::Column::UserId.eq(user_id))
            .filter(session::Column::Status.eq(SessionStatus::Active.as_str()))
            .exec(&self.db)
            .await?;
        debug!(
            "Terminated {} sessions for user {}",
            result.rows_affected, user_id
        );
        Ok(result.rows_affected)
    }

    async fn count_sessions(&self, status: SessionStatus) -> Result<u64> {
        let db = &self.db;
        let count = retry::with_retry("count_sessions", self.retry_config, || async {
            session::Entity::find()
                .filter(session::Column::Status.eq(status.as_str()))
                .count(db)
                .await
        })
        .await?;
        Ok(count)
    }

    async fn mark_stale_inactive(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = session::Entity::update_many()
            .col_expr(
                session::Column::Status,
                Expr::value(SessionStatus::Inactive.as_str()),
            )
            .filter(session::Column::Status.eq(SessionStatus::Active.as_str()))
            .filter(session::Column::LastHeartbeatAt.lt(cutoff))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
