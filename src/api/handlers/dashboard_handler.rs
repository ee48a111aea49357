//! Dashboard and statistics handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::errors::AppResult;
use crate::services::{ChurchSummary, Dashboard, Statistics};

/// Church selection for reports
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChurchScope {
    /// Another church's id (super admins only); defaults to the caller's church
    pub church_id: Option<Uuid>,
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/dashboard/overview", get(overview))
        .route("/dashboard/:domain", get(church_dashboard))
        .route("/statistics", get(statistics))
}

/// Dashboard of the caller's church
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(ChurchScope),
    responses(
        (status = 200, description = "Member and group counts", body = Dashboard),
        (status = 403, description = "Church outside the caller's scope")
    )
)]
pub async fn dashboard(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(scope): Query<ChurchScope>,
) -> AppResult<Json<Dashboard>> {
    let dashboard = state
        .services
        .reports()
        .dashboard(current_user.principal(), scope.church_id)
        .await?;
    Ok(Json(dashboard))
}

/// Dashboard of a church by domain
#[utoipa::path(
    get,
    path = "/dashboard/{domain}",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(("domain" = String, Path, description = "Church domain")),
    responses(
        (status = 200, description = "Member and group counts", body = Dashboard),
        (status = 403, description = "Another church's dashboard"),
        (status = 404, description = "Church not found")
    )
)]
pub async fn church_dashboard(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> AppResult<Json<Dashboard>> {
    let dashboard = state
        .services
        .reports()
        .dashboard_for_domain(current_user.principal(), &domain)
        .await?;
    Ok(Json(dashboard))
}

/// Per-church summary for every active church (super admin)
#[utoipa::path(
    get,
    path = "/dashboard/overview",
    tag = "Reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Church summaries", body = Vec<ChurchSummary>),
        (status = 403, description = "Super admin only")
    )
)]
pub async fn overview(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ChurchSummary>>> {
    let summaries = state.services.reports().overview(current_user.principal()).await?;
    Ok(Json(summaries))
}

/// Group occupancy, monthly growth and activity summary
#[utoipa::path(
    get,
    path = "/statistics",
    tag = "Reports",
    security(("bearer_auth" = [])),
    params(ChurchScope),
    responses(
        (status = 200, description = "Church statistics", body = Statistics),
        (status = 403, description = "Leaders and above only")
    )
)]
pub async fn statistics(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(scope): Query<ChurchScope>,
) -> AppResult<Json<Statistics>> {
    let statistics = state
        .services
        .reports()
        .statistics(current_user.principal(), scope.church_id)
        .await?;
    Ok(Json(statistics))
}
