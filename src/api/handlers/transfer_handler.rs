//! Import and export handlers.
//!
//! Exports download as a file attachment. Imports take the raw file as the
//! request body and answer with a per-row report.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Extension, Path, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::config::MAX_IMPORT_BYTES;
use crate::errors::AppResult;
use crate::services::{ImportReport, TransferModel};
use crate::utils::Format;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// csv (default), xlsx or json
    pub format: Option<Format>,
    /// Church domain to export; super admins may omit it for every church
    pub church: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImportQuery {
    /// csv (default), xlsx or json
    pub format: Option<Format>,
    /// Validate every row without writing anything
    #[serde(default)]
    pub dry_run: bool,
}

pub fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route("/export/:model", get(export))
        .route(
            "/import/:model",
            post(import).layer(DefaultBodyLimit::max(MAX_IMPORT_BYTES)),
        )
}

/// Download a data set
#[utoipa::path(
    get,
    path = "/export/{model}",
    tag = "Import/Export",
    security(("bearer_auth" = [])),
    params(
        ("model" = String, Path, description = "church, role, user, newfriend, regularmember, group or activitylog"),
        ExportQuery
    ),
    responses(
        (status = 200, description = "Encoded file", content_type = "application/octet-stream"),
        (status = 400, description = "Unknown data set or format"),
        (status = 403, description = "Admins only; own church unless super admin")
    )
)]
pub async fn export(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(model): Path<String>,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let model: TransferModel = model.parse()?;
    let file = state
        .services
        .transfer()
        .export(
            current_user.principal(),
            model,
            query.format.unwrap_or(Format::Csv),
            query.church,
        )
        .await?;

    let headers = [
        (CONTENT_TYPE, file.format.content_type().to_string()),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.filename),
        ),
    ];
    Ok((headers, file.bytes).into_response())
}

/// Upload a file of churches, users or groups
#[utoipa::path(
    post,
    path = "/import/{model}",
    tag = "Import/Export",
    security(("bearer_auth" = [])),
    params(
        ("model" = String, Path, description = "church, user or group"),
        ImportQuery
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "CSV, XLSX or JSON file"),
    responses(
        (status = 200, description = "Per-row outcome", body = ImportReport),
        (status = 400, description = "Unreadable file, missing column or export-only data set"),
        (status = 403, description = "Admins only")
    )
)]
pub async fn import(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(model): Path<String>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> AppResult<Json<ImportReport>> {
    let model: TransferModel = model.parse()?;
    let report = state
        .services
        .transfer()
        .import(
            current_user.principal(),
            model,
            query.format.unwrap_or(Format::Csv),
            body.to_vec(),
            query.dry_run,
        )
        .await?;
    Ok(Json(report))
}
