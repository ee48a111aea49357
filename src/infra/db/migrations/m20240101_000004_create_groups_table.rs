//! Migration: Create groups table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Groups::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Groups::ChurchId).uuid().not_null())
                    .col(ColumnDef::new(Groups::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Groups::GroupType).string_len(10).not_null())
                    .col(ColumnDef::new(Groups::LeaderId).uuid().null())
                    .col(ColumnDef::new(Groups::Capacity).integer().not_null())
                    .col(ColumnDef::new(Groups::MeetingTime).string_len(200).null())
                    .col(ColumnDef::new(Groups::Description).text().null())
                    .col(
                        ColumnDef::new(Groups::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Groups::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_groups_church")
                            .from(Groups::Table, Groups::ChurchId)
                            .to(Churches::Table, Churches::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_groups_leader")
                            .from(Groups::Table, Groups::LeaderId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Group names are unique within a church
        manager
            .create_index(
                Index::create()
                    .name("idx_groups_church_name")
                    .table(Groups::Table)
                    .col(Groups::ChurchId)
                    .col(Groups::Name)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Groups {
    Table,
    Id,
    ChurchId,
    Name,
    GroupType,
    LeaderId,
    Capacity,
    MeetingTime,
    Description,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum Churches {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
