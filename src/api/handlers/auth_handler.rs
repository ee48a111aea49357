//! Authentication handlers.
//!
//! `/auth/login` and `/auth/register` resolve the church from the request
//! host; the `/churches/{domain}/...` variants take it from the path.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::{ClientInfo, TenantHost, ValidatedJson};
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::UserResponse;
use crate::errors::AppResult;
use crate::services::{Registration, TokenResponse};
use crate::types::MessageResponse;

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Full church email or just the prefix before `@`
    #[validate(length(min = 1, message = "Email is required"))]
    #[schema(example = "juan@kasiglahan.jcsgo.com")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "securepassword123")]
    pub password: String,
}

/// Routes that need no token
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/super-admin/login", post(super_admin_login))
}

/// Routes for an authenticated session
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/auth/logout", post(logout))
}

pub(crate) async fn register_to(
    state: &AppState,
    domain: &str,
    registration: Registration,
    client: ClientInfo,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .services
        .auth()
        .register(domain, registration, client.0)
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub(crate) async fn login_to(
    state: &AppState,
    domain: &str,
    payload: LoginRequest,
    client: ClientInfo,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .services
        .auth()
        .login(domain, &payload.email, &payload.password, client.0)
        .await?;
    Ok(Json(token))
}

/// Register as a new friend of the church serving this host
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = Registration,
    responses(
        (status = 201, description = "New friend registered", body = UserResponse),
        (status = 400, description = "Validation error or no church subdomain"),
        (status = 403, description = "Church does not accept public registration"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    TenantHost(domain): TenantHost,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<Registration>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    register_to(&state, &domain, payload, client).await
}

/// Login to the church serving this host
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account belongs to another church")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    TenantHost(domain): TenantHost,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    login_to(&state, &domain, payload, client).await
}

/// Login without a church context (super admins only)
#[utoipa::path(
    post,
    path = "/auth/super-admin/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials or not a super admin")
    )
)]
pub async fn super_admin_login(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .services
        .auth()
        .super_admin_login(&payload.email, &payload.password, client.0)
        .await?;
    Ok(Json(token))
}

/// Record a logout; the client discards its token
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    client: ClientInfo,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .auth()
        .logout(current_user.principal(), client.0)
        .await?;
    Ok(Json(MessageResponse::new("You have been logged out")))
}

/// Church login by path, for clients without per-church hosts
#[utoipa::path(
    post,
    path = "/churches/{domain}/login",
    tag = "Authentication",
    params(("domain" = String, Path, description = "Church domain")),
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "Church not found")
    )
)]
pub async fn church_login(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    login_to(&state, &domain, payload, client).await
}

/// Church registration by path
#[utoipa::path(
    post,
    path = "/churches/{domain}/register",
    tag = "Authentication",
    params(("domain" = String, Path, description = "Church domain")),
    request_body = Registration,
    responses(
        (status = 201, description = "New friend registered", body = UserResponse),
        (status = 404, description = "Church not found"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn church_register(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<Registration>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    register_to(&state, &domain, payload, client).await
}
