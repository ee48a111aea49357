//! Migration: Create new_friends and regular_members profile tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NewFriends::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NewFriends::UserId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(NewFriends::TimerStatus)
                            .small_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(NewFriends::FollowUpStatus)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(NewFriends::FollowUpNotes).text().null())
                    .col(
                        ColumnDef::new(NewFriends::LastFollowUp)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(NewFriends::Source).string_len(100).null())
                    .col(ColumnDef::new(NewFriends::Notes).text().null())
                    .col(
                        ColumnDef::new(NewFriends::RegisteredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_new_friends_user")
                            .from(NewFriends::Table, NewFriends::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RegularMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RegularMembers::UserId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RegularMembers::RoleType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(RegularMembers::GroupId).uuid().null())
                    .col(ColumnDef::new(RegularMembers::MinistryInvolvement).text().null())
                    .col(ColumnDef::new(RegularMembers::Skills).text().null())
                    .col(
                        ColumnDef::new(RegularMembers::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_regular_members_user")
                            .from(RegularMembers::Table, RegularMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_regular_members_group")
                            .from(RegularMembers::Table, RegularMembers::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_regular_members_group_id")
                    .table(RegularMembers::Table)
                    .col(RegularMembers::GroupId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RegularMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(NewFriends::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum NewFriends {
    Table,
    UserId,
    TimerStatus,
    FollowUpStatus,
    FollowUpNotes,
    LastFollowUp,
    Source,
    Notes,
    RegisteredAt,
}

#[derive(Iden)]
enum RegularMembers {
    Table,
    UserId,
    RoleType,
    GroupId,
    MinistryInvolvement,
    Skills,
    JoinedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum Groups {
    Table,
    Id,
}
