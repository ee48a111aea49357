//! Repository layer - Data access abstraction
//!
//! Each aggregate has a trait (mockable in tests), a `*Queries` type that
//! runs against any connection so the same code serves the pool and an open
//! transaction, and a `*Store` that binds the queries to the pool.

mod activity_repository;
mod church_repository;
pub(crate) mod entities;
mod group_repository;
mod member_repository;
mod role_repository;
mod user_repository;

pub use activity_repository::{ActivityQueries, ActivityRepository, ActivityStore};
pub use church_repository::{ChurchQueries, ChurchRepository, ChurchStore};
pub use group_repository::{GroupQueries, GroupRepository, GroupStore};
pub use member_repository::{MemberQueries, MemberRepository, MemberStore};
pub use role_repository::{RoleQueries, RoleRepository, RoleStore};
pub use user_repository::{UserQueries, UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use activity_repository::MockActivityRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use church_repository::MockChurchRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use group_repository::MockGroupRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use member_repository::MockMemberRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use role_repository::MockRoleRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
