//! Migration: Create activity_logs table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActivityLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivityLogs::UserId).uuid().not_null())
                    .col(ColumnDef::new(ActivityLogs::ChurchId).uuid().not_null())
                    .col(ColumnDef::new(ActivityLogs::Action).string_len(20).not_null())
                    .col(ColumnDef::new(ActivityLogs::Description).text().not_null())
                    .col(ColumnDef::new(ActivityLogs::Metadata).text().null())
                    .col(ColumnDef::new(ActivityLogs::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(ActivityLogs::UserAgent).text().null())
                    .col(
                        ColumnDef::new(ActivityLogs::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_logs_user")
                            .from(ActivityLogs::Table, ActivityLogs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_logs_church")
                            .from(ActivityLogs::Table, ActivityLogs::ChurchId)
                            .to(Churches::Table, Churches::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activity_logs_church_timestamp")
                    .table(ActivityLogs::Table)
                    .col(ActivityLogs::ChurchId)
                    .col(ActivityLogs::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ActivityLogs {
    Table,
    Id,
    UserId,
    ChurchId,
    Action,
    Description,
    Metadata,
    IpAddress,
    UserAgent,
    Timestamp,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum Churches {
    Table,
    Id,
}
