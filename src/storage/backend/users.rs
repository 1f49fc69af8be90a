//! `UserStore` 实现

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, Condition, DbBackend, EntityTrait, ExprTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};
use tracing::{debug, trace};

use super::SeaOrmStorage;
use super::converters::model_to_user;
use super::retry;
use crate::errors::{ClickerError, Result};
use crate::storage::models::{User, UsernameUpdate};
use crate::storage::traits::UserStore;

use migration::entities::{click_event, user};

impl SeaOrmStorage {
    async fn load_user(&self, id: &str) -> Result<Option<User>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("find_user({})", id), self.retry_config, || async {
            user::Entity::find_by_id(id.to_string()).one(db).await
        })
        .await?;
        Ok(model.map(model_to_user))
    }

    /// SUM 在 PostgreSQL 上返回 NUMERIC，需要显式转回 BIGINT
    fn sum_expression(&self) -> &'static str {
        match self.db.get_database_backend() {
            DbBackend::MySql => "CAST(COALESCE(SUM(total_clicks), 0) AS SIGNED)",
            _ => "CAST(COALESCE(SUM(total_clicks), 0) AS BIGINT)",
        }
    }
}

#[async_trait]
impl UserStore for SeaOrmStorage {
    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        self.load_user(id).await
    }

    async fn create_or_touch_user(&self, id: &str, display_name: Option<&str>) -> Result<User> {
        if id.is_empty() {
            return Err(ClickerError::validation("user id must not be empty"));
        }

        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(id.to_string()),
            username: Set(None),
            display_name: Set(display_name.map(str::to_string)),
            total_clicks: Set(0),
            last_active_at: Set(Some(now)),
            created_at: Set(now),
        };

        let mut touched = vec![user::Column::LastActiveAt];
        if display_name.is_some() {
            touched.push(user::Column::DisplayName);
        }

        let db = &self.db;
        retry::with_retry(&format!("create_or_touch_user({})", id), self.retry_config, || {
            let model = model.clone();
            let touched = touched.clone();
            async move {
                user::Entity::insert(model)
                    .on_conflict(
                        OnConflict::column(user::Column::Id)
                            .update_columns(touched)
                            .to_owned(),
                    )
                    .exec_without_returning(db)
                    .await
            }
        })
        .await?;

        debug!("User contact recorded: {}", id);
        self.load_user(id)
            .await?
            .ok_or_else(|| ClickerError::store_unavailable(format!("user '{}' vanished after upsert", id)))
    }

    async fn increment_user_total(&self, id: &str, delta: i64) -> Result<Option<i64>> {
        let txn = self.db.begin().await?;

        // 读改写交给数据库完成，并发点击不会丢失增量
        let updated = user::Entity::update_many()
            .col_expr(
                user::Column::TotalClicks,
                Expr::col(user::Column::TotalClicks).add(delta),
            )
            .col_expr(user::Column::LastActiveAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(None);
        }

        let total = user::Entity::find_by_id(id.to_string())
            .select_only()
            .column(user::Column::TotalClicks)
            .into_tuple::<i64>()
            .one(&txn)
            .await?;

        txn.commit().await?;
        trace!("User {} total incremented by {} -> {:?}", id, delta, total);
        Ok(total)
    }

    async fn append_click_event(&self, user_id: &str, delta: i64, total_after: i64) -> Result<()> {
        let event = click_event::ActiveModel {
            user_id: Set(user_id.to_string()),
            delta: Set(delta),
            total_clicks: Set(total_after),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        click_event::Entity::insert(event)
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn top_users(&self, limit: usize) -> Result<Vec<User>> {
        let db = &self.db;
        let models = retry::with_retry("top_users", self.retry_config, || async {
            user::Entity::find()
                .order_by_desc(user::Column::TotalClicks)
                .order_by_asc(user::Column::CreatedAt)
                .order_by_asc(user::Column::Id)
                .limit(limit as u64)
                .all(db)
                .await
        })
        .await?;
        Ok(models.into_iter().map(model_to_user).collect())
    }

    async fn find_users(&self, ids: &[String]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let db = &self.db;
        let models = retry::with_retry("find_users", self.retry_config, || async {
            user::Entity::find()
                .filter(user::Column::Id.is_in(ids.iter().cloned()))
                .all(db)
                .await
        })
        .await?;
        Ok(models.into_iter().map(model_to_user).collect())
    }

    async fn count_users_above(&self, viewer: &User) -> Result<u64> {
        let ahead = Condition::any()
            .add(user::Column::TotalClicks.gt(viewer.total_clicks))
            .add(
                Condition::all()
                    .add(user::Column::TotalClicks.eq(viewer.total_clicks))
                    .add(user::Column::CreatedAt.lt(viewer.created_at)),
            )
            .add(
                Condition::all()
                    .add(user::Column::TotalClicks.eq(viewer.total_clicks))
                    .add(user::Column::CreatedAt.eq(viewer.created_at))
                    .add(user::Column::Id.lt(viewer.id.as_str())),
            );

        let db = &self.db;
        let count = retry::with_retry("count_users_above", self.retry_config, || async {
            user::Entity::find().filter(ahead.clone()).count(db).await
        })
        .await?;
        Ok(count)
    }

    async fn sum_totals(&self) -> Result<i64> {
        let db = &self.db;
        let sum_sql = self.sum_expression();
        let total = retry::with_retry("sum_totals", self.retry_config, || async {
            user::Entity::find()
                .select_only()
                .column_as(Expr::cust(sum_sql), "total")
                .into_tuple::<i64>()
                .one(db)
                .await
        })
        .await?;
        Ok(total.unwrap_or(0))
    }

    async fn all_totals(&self) -> Result<Vec<(String, i64)>> {
        let db = &self.db;
        let rows = retry::with_retry("all_totals", self.retry_config, || async {
            user::Entity::find()
                .select_only()
                .column(user::Column::Id)
                .column(user::Column::TotalClicks)
                .into_tuple::<(String, i64)>()
                .all(db)
                .await
        })
        .await?;
        Ok(rows)
    }

    async fn count_click_events(&self, user_id: &str) -> Result<u64> {
        let db = &self.db;
        let count = retry::with_retry("count_click_events", self.retry_config, || async {
            click_event::Entity::find()
                .filter(click_event::Column::UserId.eq(user_id))
                .count(db)
                .await
        })
        .await?;
        Ok(count)
    }

    async fn username_taken(&self, username: &str) -> Result<bool> {
        let db = &self.db;
        let count = retry::with_retry("username_taken", self.retry_config, || async {
            user::Entity::find()
                .filter(user::Column::Username.eq(username))
                .count(db)
                .await
        })
        .await?;
        Ok(count > 0)
    }

    async fn set_username(&self, user_id: &str, username: &str) -> Result<UsernameUpdate> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::Username, Expr::value(username))
            .filter(user::Column::Id.eq(user_id))
            .exec(&self.db)
            .await;

        match result {
            Ok(r) if r.rows_affected == 0 => Ok(UsernameUpdate::UserNotFound),
            Ok(_) => {
                debug!("Username for {} set to {}", user_id, username);
                Ok(UsernameUpdate::Updated)
            }
            // 唯一索引兜底并发抢注
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(UsernameUpdate::Taken)
            }
            Err(e) => Err(e.into()),
        }
    }
}
