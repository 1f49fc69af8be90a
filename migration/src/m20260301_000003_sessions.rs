//! 会话表迁移
//!
//! sessions 记录用户在某个聊天中的在线状态：
//! ACTIVE / INACTIVE / TERMINATED

use sea_orm_migration::prelude::*;

use super::m20260301_000001_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::UserId).string_len(64).not_null())
                    .col(ColumnDef::new(Sessions::ChatId).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Sessions::Status)
                            .string_len(16)
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(
                        ColumnDef::new(Sessions::LastHeartbeatAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_user")
                            .from(Sessions::Table, Sessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sessions_user_status")
                    .table(Sessions::Table)
                    .col(Sessions::UserId)
                    .col(Sessions::Status)
                    .to_owned(),
            )
            .await?;

        // 清理任务：WHERE status = 'ACTIVE' AND last_heartbeat_at < cutoff
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sessions_status_heartbeat")
                    .table(Sessions::Table)
                    .col(Sessions::Status)
                    .col(Sessions::LastHeartbeatAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_sessions_status_heartbeat").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_sessions_user_status").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Sessions {
    #[sea_orm(iden = "sessions")]
    Table,
    Id,
    UserId,
    ChatId,
    Status,
    LastHeartbeatAt,
    CreatedAt,
}
