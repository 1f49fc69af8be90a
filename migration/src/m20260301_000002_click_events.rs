//! 点击审计日志表迁移
//!
//! click_events 只追加、不修改：每次被接受的点击写入一行，
//! 记录 delta 以及应用 delta 之后的用户累计值。

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
                    .table(ClickEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClickEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::UserId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClickEvents::Delta).big_integer().not_null())
                    .col(
                        ColumnDef::new(ClickEvents::TotalClicks)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClickEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_click_events_user")
                            .from(ClickEvents::Table, ClickEvents::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 单用户时间序列查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_user_time")
                    .table(ClickEvents::Table)
                    .col(ClickEvents::UserId)
                    .col(ClickEvents::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_click_events_user_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ClickEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ClickEvents {
    #[sea_orm(iden = "click_events")]
    Table,
    Id,
    UserId,
    Delta,
    TotalClicks,
    CreatedAt,
}
