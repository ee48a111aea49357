//! Activity log handler.

use axum::{
    extract::{Extension, Query, State},
    response::Json,
    routing::get,
    Router,
};

use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::ActivityLog;
use crate::errors::AppResult;
use crate::services::ActivityQuery;
use crate::types::{Paginated, PaginatedActivity, PaginationParams};

pub fn activity_routes() -> Router<AppState> {
    Router::new().route("/activity-logs", get(list_activity))
}

/// Activity log of the caller's church, newest first
#[utoipa::path(
    get,
    path = "/activity-logs",
    tag = "Activity",
    security(("bearer_auth" = [])),
    params(ActivityQuery, PaginationParams),
    responses(
        (status = 200, description = "Page of activity entries", body = PaginatedActivity),
        (status = 403, description = "Cell leaders and above only")
    )
)]
pub async fn list_activity(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<Paginated<ActivityLog>>> {
    let entries = state
        .services
        .activity()
        .list(current_user.principal(), query, page)
        .await?;
    Ok(Json(entries))
}
