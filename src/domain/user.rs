//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::access::Principal;
use super::role::RoleCode;

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub church_id: Uuid,
    pub role: RoleCode,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub last_attendance: Option<DateTime<Utc>>,
    /// When a new friend became a regular member
    pub transition_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Identity used for access checks
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            church_id: self.church_id,
            role: self.role,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self.role, RoleCode::SuperAdmin)
    }
}

/// Data needed to insert a user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub church_id: Uuid,
    pub role: RoleCode,
    pub phone_number: Option<String>,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "juan@kasiglahan.jcsgo.com")]
    pub email: String,
    #[schema(example = "Juan")]
    pub first_name: String,
    #[schema(example = "Dela Cruz")]
    pub last_name: String,
    #[schema(example = "Juan Dela Cruz")]
    pub full_name: String,
    pub church_id: Uuid,
    pub role: RoleCode,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub last_attendance: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            full_name: user.full_name(),
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            church_id: user.church_id,
            role: user.role,
            phone_number: user.phone_number,
            is_active: user.is_active,
            last_attendance: user.last_attendance,
            created_at: user.created_at,
        }
    }
}

/// Filters for member list queries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub church_id: Option<Uuid>,
    pub roles: Vec<RoleCode>,
    /// Case-insensitive match on first name, last name or email
    pub search: Option<String>,
    pub active_only: bool,
}

impl UserFilter {
    pub fn for_church(church_id: Uuid) -> Self {
        Self {
            church_id: Some(church_id),
            ..Self::default()
        }
    }

    pub fn with_roles(mut self, roles: &[RoleCode]) -> Self {
        self.roles = roles.to_vec();
        self
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }
}
