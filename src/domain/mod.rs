//! Domain layer - Core business entities and rules.
//!
//! Churches (tenants), the fixed role ladder, users with their member
//! profiles, groups, the activity log and the access control resolver.
//! Nothing here touches the database.

pub mod access;
pub mod activity;
pub mod church;
pub mod group;
pub mod member;
pub mod password;
pub mod role;
pub mod user;

pub use access::{authorize, authorize_role_assignment, Operation, Principal};
pub use activity::{ActivityAction, ActivityFilter, ActivityLog, ClientMeta, NewActivity};
pub use church::{compose_email, normalize_domain, Church, ChurchEmail, NewChurch};
pub use group::{percentage, validate_capacity, Group, GroupFilter, GroupOccupancy, GroupType, NewGroup};
pub use member::{FollowUpStatus, MemberProfile, NewFriend, RegularMember, TimerStatus};
pub use password::Password;
pub use role::{Role, RoleCode};
pub use user::{NewUser, User, UserFilter, UserResponse};
