//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain rules and the repositories to fulfil the
//! application's use cases. Every entry point takes the acting
//! [`Principal`](crate::domain::Principal) and checks it with the access
//! control resolver before touching data; mutations run inside a Unit of
//! Work transaction together with their activity log entry.

mod activity_service;
mod auth_service;
mod church_service;
pub mod container;
mod group_service;
mod member_service;
mod report_service;
mod setup_service;
mod transfer_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use activity_service::{ActivityQuery, ActivityReader, ActivityService};
pub use auth_service::{AuthService, Authenticator, Claims, Registration, TokenResponse};
pub use church_service::{group_by_region, ChurchManager, ChurchService, RegionChurches};
pub use group_service::{CreateGroup, GroupDetail, GroupManager, GroupQuery, GroupService, GroupSummary};
pub use member_service::{
    FollowUpUpdate, MemberDetail, MemberManager, MemberQuery, MemberService, NewFriendEntry,
    RegularMemberEntry, TrackingUpdate,
};
pub use report_service::{
    group_statistics, member_counts, monthly_growth, ActionCount, ChurchSummary, Dashboard,
    GroupStatistics, MemberCounts, MonthlyGrowth, ReportService, Reporter, RoleBreakdown,
    Statistics,
};
pub use setup_service::{
    CanonicalChurch, Setup, SetupOptions, SetupReport, SetupService, CANONICAL_CHURCHES,
    SUPER_ADMIN_CHURCH,
};
pub use transfer_service::{
    export_filename, ExportFile, ImportReport, RowError, SkippedRow, Transfer, TransferModel,
    TransferService,
};

// Parallel execution utilities
pub use container::parallel;

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
