//! Member profile extensions: new friends and regular members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::role::RoleCode;
use crate::config::MAX_TIMER_STATUS;
use crate::errors::{AppError, AppResult};

/// Attendance count of a new friend, from 1st to 5th visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "u8", into = "u8")]
pub struct TimerStatus(u8);

impl TimerStatus {
    pub const FIRST: TimerStatus = TimerStatus(1);

    pub fn new(value: u8) -> AppResult<Self> {
        if (1..=MAX_TIMER_STATUS).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AppError::validation(format!(
                "Timer status must be between 1 and {}",
                MAX_TIMER_STATUS
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Reaching the last status promotes the new friend to a regular member.
    pub fn is_final(&self) -> bool {
        self.0 == MAX_TIMER_STATUS
    }

    /// Status after one more attendance, capped at the final status
    pub fn advanced(&self) -> Self {
        Self((self.0 + 1).min(MAX_TIMER_STATUS))
    }

    pub fn label(&self) -> String {
        let suffix = match self.0 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        };
        format!("{}{} Timer", self.0, suffix)
    }
}

impl TryFrom<u8> for TimerStatus {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TimerStatus> for u8 {
    fn from(status: TimerStatus) -> Self {
        status.0
    }
}

/// Follow-up progress for a new friend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FollowUpStatus {
    Pending,
    Contacted,
    FollowedUp,
    Engaged,
    NotInterested,
}

impl FollowUpStatus {
    pub const ALL: [FollowUpStatus; 5] = [
        FollowUpStatus::Pending,
        FollowUpStatus::Contacted,
        FollowUpStatus::FollowedUp,
        FollowUpStatus::Engaged,
        FollowUpStatus::NotInterested,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FollowUpStatus::Pending => "PENDING",
            FollowUpStatus::Contacted => "CONTACTED",
            FollowUpStatus::FollowedUp => "FOLLOWED_UP",
            FollowUpStatus::Engaged => "ENGAGED",
            FollowUpStatus::NotInterested => "NOT_INTERESTED",
        }
    }
}

impl std::str::FromStr for FollowUpStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        FollowUpStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| AppError::validation(format!("Unknown follow-up status: {}", s.trim())))
    }
}

impl std::fmt::Display for FollowUpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// New friend profile (role NEW_FRIEND)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NewFriend {
    pub user_id: Uuid,
    pub timer_status: TimerStatus,
    pub follow_up_status: FollowUpStatus,
    pub follow_up_notes: Option<String>,
    pub last_follow_up: Option<DateTime<Utc>>,
    /// How they found the church
    pub source: Option<String>,
    pub notes: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl NewFriend {
    pub fn fresh(user_id: Uuid, source: Option<String>) -> Self {
        Self {
            user_id,
            timer_status: TimerStatus::FIRST,
            follow_up_status: FollowUpStatus::Pending,
            follow_up_notes: None,
            last_follow_up: None,
            source,
            notes: None,
            registered_at: Utc::now(),
        }
    }
}

/// Regular member profile (roles VSL, CSL, CL, CM)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RegularMember {
    pub user_id: Uuid,
    pub role_type: RoleCode,
    pub group_id: Option<Uuid>,
    pub ministry_involvement: Option<String>,
    pub skills: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl RegularMember {
    pub fn fresh(user_id: Uuid, role_type: RoleCode) -> Self {
        Self {
            user_id,
            role_type,
            group_id: None,
            ministry_involvement: None,
            skills: None,
            joined_at: Utc::now(),
        }
    }
}

/// The role-specific extension a user carries
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberProfile {
    NewFriend(NewFriend),
    Regular(RegularMember),
    Staff,
}

impl MemberProfile {
    pub fn group_id(&self) -> Option<Uuid> {
        match self {
            MemberProfile::Regular(member) => member.group_id,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_status_bounds() {
        assert!(TimerStatus::new(0).is_err());
        assert!(TimerStatus::new(6).is_err());
        assert!(TimerStatus::new(5).unwrap().is_final());
        assert!(!TimerStatus::new(4).unwrap().is_final());
    }

    #[test]
    fn test_timer_status_advances_and_caps() {
        let third = TimerStatus::new(3).unwrap();
        assert_eq!(third.advanced().value(), 4);
        let last = TimerStatus::new(5).unwrap();
        assert_eq!(last.advanced().value(), 5);
    }

    #[test]
    fn test_timer_labels() {
        let labels: Vec<String> = (1..=5)
            .map(|v| TimerStatus::new(v).unwrap().label())
            .collect();
        assert_eq!(
            labels,
            vec!["1st Timer", "2nd Timer", "3rd Timer", "4th Timer", "5th Timer"]
        );
    }

    #[test]
    fn test_timer_status_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<TimerStatus>("7").is_err());
        assert_eq!(serde_json::from_str::<TimerStatus>("2").unwrap().value(), 2);
    }

    #[test]
    fn test_follow_up_parse() {
        assert_eq!(
            "followed up".parse::<FollowUpStatus>().unwrap(),
            FollowUpStatus::FollowedUp
        );
        assert!("maybe".parse::<FollowUpStatus>().is_err());
    }
}
