//! Append-only activity log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    Login,
    Logout,
    Register,
    ProfileUpdate,
    RoleChange,
    StatusChange,
    Attendance,
    FollowUp,
    GroupJoin,
    GroupLeave,
}

impl ActivityAction {
    pub const ALL: [ActivityAction; 10] = [
        ActivityAction::Login,
        ActivityAction::Logout,
        ActivityAction::Register,
        ActivityAction::ProfileUpdate,
        ActivityAction::RoleChange,
        ActivityAction::StatusChange,
        ActivityAction::Attendance,
        ActivityAction::FollowUp,
        ActivityAction::GroupJoin,
        ActivityAction::GroupLeave,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Login => "LOGIN",
            ActivityAction::Logout => "LOGOUT",
            ActivityAction::Register => "REGISTER",
            ActivityAction::ProfileUpdate => "PROFILE_UPDATE",
            ActivityAction::RoleChange => "ROLE_CHANGE",
            ActivityAction::StatusChange => "STATUS_CHANGE",
            ActivityAction::Attendance => "ATTENDANCE",
            ActivityAction::FollowUp => "FOLLOW_UP",
            ActivityAction::GroupJoin => "GROUP_JOIN",
            ActivityAction::GroupLeave => "GROUP_LEAVE",
        }
    }
}

impl std::str::FromStr for ActivityAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        ActivityAction::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| AppError::validation(format!("Unknown activity action: {}", s.trim())))
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request origin recorded alongside an activity entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// A recorded activity
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub church_id: Uuid,
    pub action: ActivityAction,
    pub description: String,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// An activity about to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub user_id: Uuid,
    pub church_id: Uuid,
    pub action: ActivityAction,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
    pub client: ClientMeta,
}

impl NewActivity {
    pub fn new(
        user_id: Uuid,
        church_id: Uuid,
        action: ActivityAction,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            church_id,
            action,
            description: description.into(),
            metadata: None,
            client: ClientMeta::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_client(mut self, client: ClientMeta) -> Self {
        self.client = client;
        self
    }
}

/// Filters for activity listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFilter {
    pub church_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    /// Restrict to entries about any of these users
    pub user_ids: Vec<Uuid>,
    pub action: Option<ActivityAction>,
    pub since: Option<DateTime<Utc>>,
}
