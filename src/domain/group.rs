//! Care and ministry groups with a fixed member capacity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::MAX_GROUP_CAPACITY;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupType {
    Care,
    Ministry,
}

impl GroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::Care => "CARE",
            GroupType::Ministry => "MINISTRY",
        }
    }
}

impl std::str::FromStr for GroupType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CARE" => Ok(GroupType::Care),
            "MINISTRY" => Ok(GroupType::Ministry),
            other => Err(AppError::validation(format!("Unknown group type: {}", other))),
        }
    }
}

impl std::fmt::Display for GroupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group domain entity
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Group {
    pub id: Uuid,
    pub church_id: Uuid,
    pub name: String,
    pub group_type: GroupType,
    pub leader_id: Option<Uuid>,
    pub capacity: i32,
    pub meeting_time: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn occupancy(&self, member_count: u64) -> GroupOccupancy {
        GroupOccupancy::new(self.id, member_count, self.capacity)
    }
}

/// Data needed to create a group
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub church_id: Uuid,
    pub name: String,
    pub group_type: GroupType,
    pub leader_id: Option<Uuid>,
    pub capacity: i32,
    pub meeting_time: Option<String>,
    pub description: Option<String>,
}

/// Filters for group listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupFilter {
    pub church_id: Option<Uuid>,
    pub group_type: Option<GroupType>,
    pub search: Option<String>,
    pub active_only: bool,
}

impl GroupFilter {
    pub fn for_church(church_id: Option<Uuid>) -> Self {
        Self {
            church_id,
            ..Self::default()
        }
    }
}

/// Check a capacity value.
pub fn validate_capacity(capacity: i32) -> AppResult<()> {
    if !(1..=MAX_GROUP_CAPACITY).contains(&capacity) {
        return Err(AppError::validation(format!(
            "Capacity must be between 1 and {}",
            MAX_GROUP_CAPACITY
        )));
    }
    Ok(())
}

/// Fill level of a group after a membership change
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GroupOccupancy {
    pub group_id: Uuid,
    pub member_count: u64,
    pub capacity: u64,
    /// Percentage of capacity in use, rounded to one decimal
    pub capacity_percentage: f64,
    pub is_full: bool,
}

impl GroupOccupancy {
    pub fn new(group_id: Uuid, member_count: u64, capacity: i32) -> Self {
        let capacity = capacity.max(0) as u64;
        Self {
            group_id,
            member_count,
            capacity,
            capacity_percentage: percentage(member_count, capacity),
            is_full: member_count >= capacity,
        }
    }
}

/// `part / whole` as a percentage rounded to one decimal; 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 1000.0).round() / 10.0
}
