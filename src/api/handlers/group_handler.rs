//! Group handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
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
use crate::domain::GroupOccupancy;
use crate::errors::AppResult;
use crate::services::{CreateGroup, GroupDetail, GroupQuery, GroupSummary};
use crate::types::{Paginated, PaginatedGroups, PaginationParams};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CapacityRequest {
    #[validate(range(min = 1, max = 500, message = "Capacity must be between 1 and 500"))]
    #[schema(example = 15)]
    pub capacity: i32,
}

pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/:id", get(get_group))
        .route("/groups/:id/capacity", put(update_capacity))
        .route(
            "/groups/:id/members/:user_id",
            post(add_member).delete(remove_member),
        )
}

/// Groups with their occupancy
#[utoipa::path(
    get,
    path = "/groups",
    tag = "Groups",
    security(("bearer_auth" = [])),
    params(GroupQuery, PaginationParams),
    responses(
        (status = 200, description = "Page of groups", body = PaginatedGroups),
        (status = 403, description = "Cell members and above only")
    )
)]
pub async fn list_groups(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<Paginated<GroupSummary>>> {
    let groups = state
        .services
        .groups()
        .list(current_user.principal(), query, page)
        .await?;
    Ok(Json(groups))
}

#[utoipa::path(
    post,
    path = "/groups",
    tag = "Groups",
    security(("bearer_auth" = [])),
    request_body = CreateGroup,
    responses(
        (status = 201, description = "Group created", body = GroupSummary),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Cell servant leaders and above only"),
        (status = 409, description = "Group name already used in this church"),
        (status = 422, description = "Leader belongs to another church")
    )
)]
pub async fn create_group(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateGroup>,
) -> AppResult<(StatusCode, Json<GroupSummary>)> {
    let group = state
        .services
        .groups()
        .create(current_user.principal(), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// Group page: leader, members and recent activity
#[utoipa::path(
    get,
    path = "/groups/{id}",
    tag = "Groups",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group detail", body = GroupDetail),
        (status = 403, description = "Group of another church"),
        (status = 404, description = "Group not found")
    )
)]
pub async fn get_group(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<GroupDetail>> {
    let detail = state
        .services
        .groups()
        .get(current_user.principal(), id)
        .await?;
    Ok(Json(detail))
}

#[utoipa::path(
    put,
    path = "/groups/{id}/capacity",
    tag = "Groups",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Group ID")),
    request_body = CapacityRequest,
    responses(
        (status = 200, description = "Capacity updated", body = GroupSummary),
        (status = 400, description = "Below the current member count"),
        (status = 403, description = "Cell servant leaders and above only")
    )
)]
pub async fn update_capacity(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CapacityRequest>,
) -> AppResult<Json<GroupSummary>> {
    let group = state
        .services
        .groups()
        .update_capacity(current_user.principal(), id, payload.capacity)
        .await?;
    Ok(Json(group))
}

/// Add a regular member to a group
#[utoipa::path(
    post,
    path = "/groups/{id}/members/{user_id}",
    tag = "Groups",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Group ID"),
        ("user_id" = Uuid, Path, description = "Member's user ID")
    ),
    responses(
        (status = 200, description = "Member added", body = GroupOccupancy),
        (status = 400, description = "Not a regular member, or already in another group"),
        (status = 403, description = "Cell leaders and above only"),
        (status = 404, description = "Group or member not found"),
        (status = 409, description = "Group is full or member already in it"),
        (status = 422, description = "Member and group belong to different churches")
    )
)]
pub async fn add_member(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    client: ClientInfo,
) -> AppResult<Json<GroupOccupancy>> {
    let occupancy = state
        .services
        .groups()
        .add_member(current_user.principal(), id, user_id, client.0)
        .await?;
    Ok(Json(occupancy))
}

/// Remove a member from a group
#[utoipa::path(
    delete,
    path = "/groups/{id}/members/{user_id}",
    tag = "Groups",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Group ID"),
        ("user_id" = Uuid, Path, description = "Member's user ID")
    ),
    responses(
        (status = 200, description = "Member removed", body = GroupOccupancy),
        (status = 403, description = "Cell leaders and above only"),
        (status = 404, description = "Member is not in this group")
    )
)]
pub async fn remove_member(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    client: ClientInfo,
) -> AppResult<Json<GroupOccupancy>> {
    let occupancy = state
        .services
        .groups()
        .remove_member(current_user.principal(), id, user_id, client.0)
        .await?;
    Ok(Json(occupancy))
}
