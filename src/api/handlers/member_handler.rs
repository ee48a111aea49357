//! Member handlers: listings, member pages, new friend tracking and role changes.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{ClientInfo, ValidatedJson};
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{FollowUpStatus, NewFriend, RoleCode, TimerStatus, UserResponse};
use crate::errors::AppResult;
use crate::services::{
    FollowUpUpdate, MemberDetail, MemberQuery, NewFriendEntry, RegularMemberEntry, TrackingUpdate,
};
use crate::types::{
    Paginated, PaginatedMembers, PaginatedNewFriends, PaginatedRegularMembers, PaginationParams,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TimerStatusRequest {
    /// 1 to 5; reaching 5 promotes the new friend to CM
    #[schema(example = 2)]
    pub status: TimerStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FollowUpRequest {
    pub status: FollowUpStatus,
    #[validate(length(max = 2000, message = "Notes are limited to 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RoleChangeRequest {
    #[schema(example = "CL")]
    pub role: RoleCode,
}

pub fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/members", get(list_members))
        .route("/members/:id", get(get_member))
        .route("/members/:id/role", put(change_role))
        .route("/members/:id/timer-status", post(update_timer_status))
        .route("/members/:id/attendance", post(record_attendance))
        .route("/members/:id/follow-up", post(update_follow_up))
        .route("/new-friends", get(list_new_friends))
        .route("/regular-members", get(list_regular_members))
}

/// Members of the caller's church
#[utoipa::path(
    get,
    path = "/members",
    tag = "Members",
    security(("bearer_auth" = [])),
    params(MemberQuery, PaginationParams),
    responses(
        (status = 200, description = "Page of members", body = PaginatedMembers),
        (status = 403, description = "Cell members and above only")
    )
)]
pub async fn list_members(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(query): Query<MemberQuery>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    let members = state
        .services
        .members()
        .list_members(current_user.principal(), query, page)
        .await?;
    Ok(Json(members))
}

/// New friends with their tracking profile
#[utoipa::path(
    get,
    path = "/new-friends",
    tag = "Members",
    security(("bearer_auth" = [])),
    params(MemberQuery, PaginationParams),
    responses(
        (status = 200, description = "Page of new friends", body = PaginatedNewFriends)
    )
)]
pub async fn list_new_friends(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(query): Query<MemberQuery>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<Paginated<NewFriendEntry>>> {
    let entries = state
        .services
        .members()
        .list_new_friends(current_user.principal(), query, page)
        .await?;
    Ok(Json(entries))
}

/// Regular members with their group assignment
#[utoipa::path(
    get,
    path = "/regular-members",
    tag = "Members",
    security(("bearer_auth" = [])),
    params(MemberQuery, PaginationParams),
    responses(
        (status = 200, description = "Page of regular members", body = PaginatedRegularMembers)
    )
)]
pub async fn list_regular_members(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(query): Query<MemberQuery>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<Paginated<RegularMemberEntry>>> {
    let entries = state
        .services
        .members()
        .list_regular_members(current_user.principal(), query, page)
        .await?;
    Ok(Json(entries))
}

/// Member page: profile, group and recent activity
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "Members",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Member detail", body = MemberDetail),
        (status = 403, description = "Member of another church"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MemberDetail>> {
    let detail = state
        .services
        .members()
        .get_member(current_user.principal(), id)
        .await?;
    Ok(Json(detail))
}

/// Set a new friend's timer status
#[utoipa::path(
    post,
    path = "/members/{id}/timer-status",
    tag = "Members",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = TimerStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = TrackingUpdate),
        (status = 400, description = "Not a new friend or status out of range"),
        (status = 403, description = "Cell leaders and above only")
    )
)]
pub async fn update_timer_status(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<TimerStatusRequest>,
) -> AppResult<Json<TrackingUpdate>> {
    let update = state
        .services
        .members()
        .update_timer_status(current_user.principal(), id, payload.status, client.0)
        .await?;
    Ok(Json(update))
}

/// Record that a member attended a service
#[utoipa::path(
    post,
    path = "/members/{id}/attendance",
    tag = "Members",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Attendance recorded", body = TrackingUpdate),
        (status = 403, description = "Cell leaders and above only"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn record_attendance(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    client: ClientInfo,
) -> AppResult<Json<TrackingUpdate>> {
    let update = state
        .services
        .members()
        .record_attendance(current_user.principal(), id, client.0)
        .await?;
    Ok(Json(update))
}

/// Update a new friend's follow-up status and notes
#[utoipa::path(
    post,
    path = "/members/{id}/follow-up",
    tag = "Members",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = FollowUpRequest,
    responses(
        (status = 200, description = "Follow-up saved", body = NewFriend),
        (status = 400, description = "Not a new friend"),
        (status = 403, description = "Cell leaders and above only")
    )
)]
pub async fn update_follow_up(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<FollowUpRequest>,
) -> AppResult<Json<NewFriend>> {
    let update = FollowUpUpdate {
        status: payload.status,
        notes: payload.notes,
    };
    let profile = state
        .services
        .members()
        .update_follow_up(current_user.principal(), id, update, client.0)
        .await?;
    Ok(Json(profile))
}

/// Change a member's role
#[utoipa::path(
    put,
    path = "/members/{id}/role",
    tag = "Members",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = RoleChangeRequest,
    responses(
        (status = 200, description = "Role changed", body = UserResponse),
        (status = 403, description = "Admins only; cannot grant a role above your own"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn change_role(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<RoleChangeRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .services
        .members()
        .change_role(current_user.principal(), id, payload.role, client.0)
        .await?;
    Ok(Json(user))
}
