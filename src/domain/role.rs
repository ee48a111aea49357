//! Role registry: the fixed set of roles and their permission levels.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;

/// Role codes, ordered from most to least privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleCode {
    SuperAdmin,
    Admin,
    /// Vine Servant Leader
    Vsl,
    /// Cluster Servant Leader
    Csl,
    /// Care Leader
    Cl,
    /// Care Member
    Cm,
    NewFriend,
}

impl RoleCode {
    pub const ALL: [RoleCode; 7] = [
        RoleCode::SuperAdmin,
        RoleCode::Admin,
        RoleCode::Vsl,
        RoleCode::Csl,
        RoleCode::Cl,
        RoleCode::Cm,
        RoleCode::NewFriend,
    ];

    /// Roles that carry a regular member profile
    pub const REGULAR: [RoleCode; 4] = [RoleCode::Vsl, RoleCode::Csl, RoleCode::Cl, RoleCode::Cm];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleCode::SuperAdmin => "SUPER_ADMIN",
            RoleCode::Admin => "ADMIN",
            RoleCode::Vsl => "VSL",
            RoleCode::Csl => "CSL",
            RoleCode::Cl => "CL",
            RoleCode::Cm => "CM",
            RoleCode::NewFriend => "NEW_FRIEND",
        }
    }

    /// Ordinal permission level; higher means more privileged.
    pub fn level(&self) -> i32 {
        match self {
            RoleCode::SuperAdmin => 100,
            RoleCode::Admin => 80,
            RoleCode::Vsl => 60,
            RoleCode::Csl => 50,
            RoleCode::Cl => 40,
            RoleCode::Cm => 20,
            RoleCode::NewFriend => 10,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RoleCode::SuperAdmin => "Super Administrator",
            RoleCode::Admin => "Church Administrator",
            RoleCode::Vsl => "Vine Servant Leader",
            RoleCode::Csl => "Cluster Servant Leader",
            RoleCode::Cl => "Care Leader",
            RoleCode::Cm => "Care Member",
            RoleCode::NewFriend => "New Friend",
        }
    }

    /// Staff accounts have no member profile and are left out of member counts.
    pub fn is_staff(&self) -> bool {
        matches!(self, RoleCode::SuperAdmin | RoleCode::Admin)
    }

    pub fn is_regular(&self) -> bool {
        Self::REGULAR.contains(self)
    }

    pub fn is_new_friend(&self) -> bool {
        matches!(self, RoleCode::NewFriend)
    }

    pub fn at_least(&self, other: RoleCode) -> bool {
        self.level() >= other.level()
    }
}

impl std::str::FromStr for RoleCode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        RoleCode::ALL
            .into_iter()
            .find(|code| code.as_str() == normalized)
            .ok_or_else(|| AppError::validation(format!("Unknown role: {}", s.trim())))
    }
}

impl std::fmt::Display for RoleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted role row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Role {
    pub code: RoleCode,
    pub permission_level: i32,
    pub description: String,
}

impl From<RoleCode> for Role {
    fn from(code: RoleCode) -> Self {
        Self {
            code,
            permission_level: code.level(),
            description: code.description().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_strictly_ordered() {
        let levels: Vec<i32> = RoleCode::ALL.iter().map(|r| r.level()).collect();
        assert!(levels.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_parse_role_codes() {
        assert_eq!("super_admin".parse::<RoleCode>().unwrap(), RoleCode::SuperAdmin);
        assert_eq!("New Friend".parse::<RoleCode>().unwrap(), RoleCode::NewFriend);
        assert_eq!(" cl ".parse::<RoleCode>().unwrap(), RoleCode::Cl);
        assert!("pastor".parse::<RoleCode>().is_err());
    }

    #[test]
    fn test_role_groups() {
        assert!(RoleCode::Admin.is_staff());
        assert!(!RoleCode::Admin.is_regular());
        assert!(RoleCode::Cm.is_regular());
        assert!(!RoleCode::NewFriend.is_regular());
        assert!(RoleCode::Csl.at_least(RoleCode::Cl));
        assert!(!RoleCode::Cm.at_least(RoleCode::Cl));
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&RoleCode::NewFriend).unwrap();
        assert_eq!(json, "\"NEW_FRIEND\"");
    }
}
