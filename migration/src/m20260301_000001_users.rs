//! 用户表迁移
//!
//! 创建 users 表：
//! - id 为消息平台的外部用户 ID（如 Telegram user id）
//! - total_clicks 为累计点击数（权威值）
//! - username 设置后全局唯一

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Username).string_len(32).null())
                    .col(ColumnDef::new(Users::DisplayName).string_len(255).null())
                    .col(
                        ColumnDef::new(Users::TotalClicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::LastActiveAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // username 唯一索引（NULL 不参与唯一约束）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_username")
                    .table(Users::Table)
                    .col(Users::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 排行榜查询：ORDER BY total_clicks DESC, created_at ASC
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_total_clicks")
                    .table(Users::Table)
                    .col(Users::TotalClicks)
                    .col(Users::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_users_total_clicks").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_users_username").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Username,
    DisplayName,
    TotalClicks,
    LastActiveAt,
    CreatedAt,
}
