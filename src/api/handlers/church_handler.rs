//! Church directory handlers.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::auth_handler::{church_login, church_register};
use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{Church, NewChurch};
use crate::errors::AppResult;
use crate::services::RegionChurches;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DetectChurchRequest {
    #[validate(length(min = 3, message = "Email is required"))]
    #[schema(example = "juan@kasiglahan.jcsgo.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChurchStatusRequest {
    pub is_active: bool,
}

/// Public church routes
pub fn church_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_churches))
        .route("/detect", post(detect_church))
        .route("/:domain/login", post(church_login))
        .route("/:domain/register", post(church_register))
}

/// Church administration routes (token required)
pub fn church_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/churches", post(create_church))
        .route("/admin/churches/:id/active", put(set_church_active))
}

/// Active churches grouped by region
#[utoipa::path(
    get,
    path = "/churches",
    tag = "Churches",
    responses(
        (status = 200, description = "Church directory", body = Vec<RegionChurches>)
    )
)]
pub async fn list_churches(State(state): State<AppState>) -> AppResult<Json<Vec<RegionChurches>>> {
    let directory = state.services.churches().directory().await?;
    Ok(Json(directory))
}

/// Find the church an email address belongs to
#[utoipa::path(
    post,
    path = "/churches/detect",
    tag = "Churches",
    request_body = DetectChurchRequest,
    responses(
        (status = 200, description = "Church for the address", body = Church),
        (status = 400, description = "Not a church email address"),
        (status = 404, description = "No active church with that domain")
    )
)]
pub async fn detect_church(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<DetectChurchRequest>,
) -> AppResult<Json<Church>> {
    let church = state
        .services
        .churches()
        .detect_from_email(&payload.email)
        .await?;
    Ok(Json(church))
}

/// Register a new church (super admin)
#[utoipa::path(
    post,
    path = "/admin/churches",
    tag = "Churches",
    security(("bearer_auth" = [])),
    request_body = NewChurch,
    responses(
        (status = 201, description = "Church created", body = Church),
        (status = 400, description = "Invalid domain or name"),
        (status = 403, description = "Super admin only"),
        (status = 409, description = "Domain already in use")
    )
)]
pub async fn create_church(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(payload): Json<NewChurch>,
) -> AppResult<(StatusCode, Json<Church>)> {
    let church = state
        .services
        .churches()
        .create(current_user.principal(), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(church)))
}

/// Open or close a church; inactive churches disappear from the directory
/// and refuse logins (super admin)
#[utoipa::path(
    put,
    path = "/admin/churches/{id}/active",
    tag = "Churches",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Church ID")),
    request_body = ChurchStatusRequest,
    responses(
        (status = 200, description = "Church updated", body = Church),
        (status = 403, description = "Super admin only"),
        (status = 404, description = "Church not found")
    )
)]
pub async fn set_church_active(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChurchStatusRequest>,
) -> AppResult<Json<Church>> {
    let church = state
        .services
        .churches()
        .set_active(current_user.principal(), id, payload.is_active)
        .await?;
    Ok(Json(church))
}
