//! Database migrations.
//!
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}

use sea_orm_migration::prelude::*;

mod m20240101_000001_create_churches_table;
mod m20240101_000002_create_roles_table;
mod m20240101_000003_create_users_table;
mod m20240101_000004_create_groups_table;
mod m20240101_000005_create_member_profiles_tables;
mod m20240101_000006_create_activity_logs_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_churches_table::Migration),
            Box::new(m20240101_000002_create_roles_table::Migration),
            Box::new(m20240101_000003_create_users_table::Migration),
            Box::new(m20240101_000004_create_groups_table::Migration),
            Box::new(m20240101_000005_create_member_profiles_tables::Migration),
            Box::new(m20240101_000006_create_activity_logs_table::Migration),
        ]
    }
}
