//! OpenAPI documentation configuration.
//!
//! Served through Swagger UI at `/swagger-ui`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    activity_handler, auth_handler, church_handler, dashboard_handler, group_handler,
    member_handler, transfer_handler,
};
use crate::domain::{
    ActivityAction, ActivityLog, Church, FollowUpStatus, Group, GroupOccupancy, GroupType,
    NewChurch, NewFriend, RegularMember, RoleCode, TimerStatus, UserResponse,
};
use crate::services::{
    ActionCount, ChurchSummary, CreateGroup, Dashboard, GroupDetail, GroupStatistics,
    GroupSummary, ImportReport, MemberCounts, MemberDetail, MonthlyGrowth, NewFriendEntry,
    RegionChurches, Registration, RegularMemberEntry, RoleBreakdown, RowError, SkippedRow,
    Statistics, TokenResponse, TrackingUpdate, TransferModel,
};
use crate::types::{
    MessageResponse, PaginatedActivity, PaginatedGroups, PaginatedMembers, PaginatedNewFriends,
    PaginatedRegularMembers, PaginationMeta,
};
use crate::utils::Format;

/// OpenAPI documentation for the church administration API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "JCSGO Church Administration API",
        version = "0.1.0",
        description = "Multi-church membership administration: members, new friend tracking, groups, activity and reports",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        church_handler::list_churches,
        church_handler::detect_church,
        church_handler::create_church,
        church_handler::set_church_active,
        auth_handler::register,
        auth_handler::login,
        auth_handler::super_admin_login,
        auth_handler::logout,
        auth_handler::church_login,
        auth_handler::church_register,
        dashboard_handler::dashboard,
        dashboard_handler::church_dashboard,
        dashboard_handler::overview,
        dashboard_handler::statistics,
        member_handler::list_members,
        member_handler::list_new_friends,
        member_handler::list_regular_members,
        member_handler::get_member,
        member_handler::update_timer_status,
        member_handler::record_attendance,
        member_handler::update_follow_up,
        member_handler::change_role,
        group_handler::list_groups,
        group_handler::create_group,
        group_handler::get_group,
        group_handler::update_capacity,
        group_handler::add_member,
        group_handler::remove_member,
        activity_handler::list_activity,
        transfer_handler::export,
        transfer_handler::import,
    ),
    components(
        schemas(
            // Domain types
            Church,
            NewChurch,
            RoleCode,
            UserResponse,
            TimerStatus,
            FollowUpStatus,
            NewFriend,
            RegularMember,
            GroupType,
            Group,
            GroupOccupancy,
            ActivityAction,
            ActivityLog,
            // Auth and churches
            Registration,
            TokenResponse,
            RegionChurches,
            auth_handler::LoginRequest,
            church_handler::DetectChurchRequest,
            church_handler::ChurchStatusRequest,
            MessageResponse,
            // Members and groups
            NewFriendEntry,
            RegularMemberEntry,
            MemberDetail,
            TrackingUpdate,
            member_handler::TimerStatusRequest,
            member_handler::FollowUpRequest,
            member_handler::RoleChangeRequest,
            CreateGroup,
            GroupSummary,
            GroupDetail,
            group_handler::CapacityRequest,
            // Reports
            RoleBreakdown,
            MemberCounts,
            Dashboard,
            GroupStatistics,
            MonthlyGrowth,
            ActionCount,
            Statistics,
            ChurchSummary,
            // Import/export
            Format,
            TransferModel,
            ImportReport,
            SkippedRow,
            RowError,
            // Pages
            PaginationMeta,
            PaginatedMembers,
            PaginatedNewFriends,
            PaginatedRegularMembers,
            PaginatedGroups,
            PaginatedActivity,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Churches", description = "Church directory and administration"),
        (name = "Authentication", description = "Church login, registration and logout"),
        (name = "Reports", description = "Dashboards and statistics"),
        (name = "Members", description = "Members, new friend tracking and roles"),
        (name = "Groups", description = "Care and ministry groups"),
        (name = "Activity", description = "Activity log"),
        (name = "Import/Export", description = "CSV, XLSX and JSON transfer")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from a login endpoint"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_protected_and_public_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/churches"));
        assert!(paths.contains_key("/groups/{id}/members/{user_id}"));
        assert!(paths.contains_key("/import/{model}"));
        assert!(doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }
}
