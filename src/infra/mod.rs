//! Infrastructure layer - External systems integration
//!
//! - Database connection and schema migrations
//! - Repositories over the SeaORM entities
//! - Unit of Work for transaction management

pub mod db;
pub mod repositories;
pub mod unit_of_work;

pub use db::{Database, MigrationState, Migrator};
pub use repositories::{
    ActivityRepository, ChurchRepository, GroupRepository, MemberRepository, RoleRepository,
    UserRepository,
};
pub use unit_of_work::{Persistence, TransactionContext, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockActivityRepository, MockChurchRepository, MockGroupRepository, MockMemberRepository,
    MockRoleRepository, MockUserRepository,
};
