//! Authentication service - church-scoped login, registration and tokens.
//!
//! Passwords are hashed by the domain `Password` value object; every
//! successful login, logout and registration is appended to the activity log.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::config::{Config, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::{
    ActivityAction, Church, ClientMeta, NewActivity, NewFriend, NewUser, Password, Principal,
    RoleCode, User, UserResponse,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

/// Argon2 PHC string that parses but matches no password; verified against
/// when the account does not exist so both paths cost the same.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$ZHVtbXlzYWx0MTIzNDU2$3n1CPkUeOzmDOKbNWc8yRLMY8lN8bnFHXzfNGbW4Yk0";

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub church_id: Uuid,
    pub role: RoleCode,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.sub,
            church_id: self.church_id,
            role: self.role,
        }
    }
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Public registration form for a church. The email is composed from
/// `email_prefix` and the church's domain.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct Registration {
    #[validate(length(min = 3, max = 50, message = "Email prefix must be 3-50 characters"))]
    #[schema(example = "juan")]
    pub email_prefix: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "securepassword123")]
    pub password: String,
    #[schema(example = "securepassword123")]
    pub password_confirm: String,
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    #[schema(example = "Juan")]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    #[schema(example = "Dela Cruz")]
    pub last_name: String,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    /// How the new friend heard about the church
    pub source: Option<String>,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new friend in the church identified by `church_domain`
    async fn register(
        &self,
        church_domain: &str,
        registration: Registration,
        client: ClientMeta,
    ) -> AppResult<User>;

    /// Login to a church. `email` may be a full address or just the prefix.
    async fn login(
        &self,
        church_domain: &str,
        email: &str,
        password: &str,
        client: ClientMeta,
    ) -> AppResult<TokenResponse>;

    /// Login outside any church context; only SUPER_ADMIN accounts succeed
    async fn super_admin_login(&self, email: &str, password: &str, client: ClientMeta) -> AppResult<TokenResponse>;

    /// Record a logout. Tokens are stateless and simply expire.
    async fn logout(&self, principal: Principal, client: ClientMeta) -> AppResult<()>;

    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;

    /// Resolve a bearer token to the account as it is now. Role and
    /// church come from the database, not the claims, so a demoted or
    /// deactivated user loses access before the token expires.
    async fn authenticate(&self, token: &str) -> AppResult<User>;
}

/// Generate JWT token for a user
fn generate_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        church_id: user.church_id,
        role: user.role,
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
        user: UserResponse::from(user.clone()),
    })
}

fn verify_token_internal(token: &str, config: &Config) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, config: Config) -> Self {
        Self { uow, config }
    }

    async fn active_church(&self, domain: &str) -> AppResult<Church> {
        self.uow
            .churches()
            .find_by_domain(domain)
            .await?
            .filter(|church| church.is_active)
            .ok_or_not_found("Church")
    }

    /// Look the user up and check the password, spending the same hashing
    /// effort whether or not the account exists.
    async fn check_credentials(&self, email: &str, password: &str) -> AppResult<User> {
        let user = self.uow.users().find_by_email(email).await?;

        let stored = match &user {
            Some(user) => Password::from_hash(user.password_hash.clone()),
            None => Password::from_hash(DUMMY_HASH.to_string()),
        };
        let password_valid = stored.verify(password);

        match user {
            Some(user) if password_valid => {
                if !user.is_active {
                    tracing::warn!(user_id = %user.id, "Login attempt on inactive account");
                    return Err(AppError::InvalidCredentials);
                }
                Ok(user)
            }
            _ => Err(AppError::InvalidCredentials),
        }
    }

    async fn record_login(&self, user: &User, client: ClientMeta) -> AppResult<()> {
        self.uow
            .activity()
            .append(
                NewActivity::new(
                    user.id,
                    user.church_id,
                    ActivityAction::Login,
                    format!("{} logged in", user.full_name()),
                )
                .with_client(client),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(
        &self,
        church_domain: &str,
        registration: Registration,
        client: ClientMeta,
    ) -> AppResult<User> {
        let church = self.active_church(church_domain).await?;
        if !church.allow_public_registration {
            return Err(AppError::denied(format!(
                "public registration is closed for {}",
                church.name
            )));
        }

        let email = church.compose_email(&registration.email_prefix, &self.config.email_domain)?;
        if self.uow.users().find_by_email(&email).await?.is_some() {
            return Err(AppError::duplicate(format!("User '{}'", email)));
        }

        let password = Password::confirmed(&registration.password, &registration.password_confirm)?;
        let new_user = NewUser {
            email,
            password_hash: password.into_string(),
            first_name: registration.first_name.trim().to_string(),
            last_name: registration.last_name.trim().to_string(),
            church_id: church.id,
            role: RoleCode::NewFriend,
            phone_number: registration.phone_number.filter(|p| !p.trim().is_empty()),
        };
        let source = registration.source.filter(|s| !s.trim().is_empty());

        let user = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let user = ctx.users().create(new_user).await?;
                    ctx.members()
                        .create_new_friend(NewFriend::fresh(user.id, source))
                        .await?;
                    ctx.activity()
                        .append(
                            NewActivity::new(
                                user.id,
                                user.church_id,
                                ActivityAction::Register,
                                format!("{} registered as a new friend", user.full_name()),
                            )
                            .with_client(client),
                        )
                        .await?;
                    Ok(user)
                })
            })
            .await?;

        tracing::info!(user_id = %user.id, church = %church.domain, "New friend registered");
        Ok(user)
    }

    async fn login(
        &self,
        church_domain: &str,
        email: &str,
        password: &str,
        client: ClientMeta,
    ) -> AppResult<TokenResponse> {
        let church = self.active_church(church_domain).await?;

        let email = if email.contains('@') {
            email.trim().to_ascii_lowercase()
        } else {
            church
                .compose_email(email, &self.config.email_domain)
                .map_err(|_| AppError::InvalidCredentials)?
        };

        let user = self.check_credentials(&email, password).await?;

        if user.church_id != church.id && !user.is_super_admin() {
            tracing::warn!(
                user_id = %user.id,
                church = %church.domain,
                "Login rejected: account belongs to another church"
            );
            return Err(AppError::denied(format!(
                "this account does not belong to {}",
                church.name
            )));
        }

        self.record_login(&user, client).await?;
        generate_token(&user, &self.config)
    }

    async fn super_admin_login(&self, email: &str, password: &str, client: ClientMeta) -> AppResult<TokenResponse> {
        let user = self
            .check_credentials(&email.trim().to_ascii_lowercase(), password)
            .await?;

        if !user.is_super_admin() {
            tracing::warn!(user_id = %user.id, "Super admin login attempted by {}", user.role);
            return Err(AppError::InvalidCredentials);
        }

        self.record_login(&user, client).await?;
        generate_token(&user, &self.config)
    }

    async fn logout(&self, principal: Principal, client: ClientMeta) -> AppResult<()> {
        let user = self
            .uow
            .users()
            .find_by_id(principal.user_id)
            .await?
            .ok_or_not_found("User")?;

        self.uow
            .activity()
            .append(
                NewActivity::new(
                    user.id,
                    user.church_id,
                    ActivityAction::Logout,
                    format!("{} logged out", user.full_name()),
                )
                .with_client(client),
            )
            .await?;
        Ok(())
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        verify_token_internal(token, &self.config)
    }

    async fn authenticate(&self, token: &str) -> AppResult<User> {
        let claims = self.verify_token(token)?;

        match self.uow.users().find_by_id(claims.sub).await? {
            Some(user) if user.is_active => Ok(user),
            Some(_) => {
                tracing::warn!(user_id = %claims.sub, "Token presented for inactive account");
                Err(AppError::Unauthorized)
            }
            None => Err(AppError::Unauthorized),
        }
    }
}
