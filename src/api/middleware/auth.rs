//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::{Principal, RoleCode, User};
use crate::errors::AppError;

/// Authenticated user, reloaded from the database on every request
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub church_id: Uuid,
    pub role: RoleCode,
}

impl CurrentUser {
    /// Identity handed to the services for access checks
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            church_id: self.church_id,
            role: self.role,
        }
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            church_id: user.church_id,
            role: user.role,
        }
    }
}

/// JWT authentication middleware.
///
/// Extracts and validates the JWT token from the Authorization header,
/// reloads the account it names, then injects the CurrentUser into the
/// request extensions. Missing or inactive accounts are `UNAUTHORIZED`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .ok_or(AppError::Unauthorized)?;

    let user = state.services.auth().authenticate(token).await?;
    request.extensions_mut().insert(CurrentUser::from(user));

    Ok(next.run(request).await)
}
