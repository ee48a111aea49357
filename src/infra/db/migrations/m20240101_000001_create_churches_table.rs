//! Migration: Create churches table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Churches::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Churches::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Churches::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Churches::Domain)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Churches::Location).string_len(200).not_null())
                    .col(ColumnDef::new(Churches::Region).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Churches::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Churches::AllowPublicRegistration)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Churches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Churches::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Churches::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Churches {
    Table,
    Id,
    Name,
    Domain,
    Location,
    Region,
    IsActive,
    AllowPublicRegistration,
    CreatedAt,
    UpdatedAt,
}
