//! Reporting - dashboards and statistics, recomputed on every request.
//!
//! Staff accounts (ADMIN, SUPER_ADMIN) are not members and never appear in
//! the member counts.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::container::parallel;
use crate::config::{ACTIVITY_SUMMARY_DAYS, GROWTH_MONTHS, RECENT_ACTIVITY_LIMIT};
use crate::domain::{
    authorize, percentage, ActivityAction, ActivityFilter, ActivityLog, Church, GroupFilter,
    GroupType, Operation, Principal, RoleCode,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RoleBreakdown {
    pub role: RoleCode,
    pub count: u64,
    /// Share of all regular members, one decimal
    pub percentage: f64,
}

/// Member counts for one church, or all churches when `church` is absent
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MemberCounts {
    pub total_members: u64,
    pub new_friends: u64,
    pub regular_members: u64,
    pub role_breakdown: Vec<RoleBreakdown>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Dashboard {
    pub church: Option<Church>,
    #[serde(flatten)]
    pub counts: MemberCounts,
    pub active_groups: u64,
    /// Empty when the viewer may not read the activity log
    pub recent_activity: Vec<ActivityLog>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GroupStatistics {
    pub total_groups: u64,
    pub care_groups: u64,
    pub ministry_groups: u64,
    pub members_in_groups: u64,
    pub average_group_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyGrowth {
    #[schema(example = "May 2026")]
    pub month: String,
    pub new_members: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ActionCount {
    pub action: ActivityAction,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Statistics {
    pub dashboard: Dashboard,
    pub groups: GroupStatistics,
    /// Oldest month first
    pub growth: Vec<MonthlyGrowth>,
    /// Entries per action over the last 30 days, most frequent first
    pub activity_summary: Vec<ActionCount>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChurchSummary {
    pub church: Church,
    #[serde(flatten)]
    pub counts: MemberCounts,
    pub active_groups: u64,
}

#[async_trait]
pub trait ReportService: Send + Sync {
    /// Dashboard for `church_id`, defaulting to the principal's church
    /// (all churches for a super admin).
    async fn dashboard(&self, principal: Principal, church_id: Option<Uuid>) -> AppResult<Dashboard>;

    async fn dashboard_for_domain(&self, principal: Principal, domain: &str) -> AppResult<Dashboard>;

    async fn statistics(&self, principal: Principal, church_id: Option<Uuid>) -> AppResult<Statistics>;

    /// Per-church summaries for every active church (super admin)
    async fn overview(&self, principal: Principal) -> AppResult<Vec<ChurchSummary>>;
}

/// Fold per-role user counts into member counts.
pub fn member_counts(by_role: &[(RoleCode, u64)]) -> MemberCounts {
    let count_of = |role: RoleCode| -> u64 {
        by_role
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, count)| *count)
            .sum()
    };

    let new_friends = count_of(RoleCode::NewFriend);
    let regular_members: u64 = RoleCode::REGULAR.iter().map(|r| count_of(*r)).sum();
    let role_breakdown = RoleCode::REGULAR
        .iter()
        .map(|role| {
            let count = count_of(*role);
            RoleBreakdown {
                role: *role,
                count,
                percentage: percentage(count, regular_members),
            }
        })
        .collect();

    MemberCounts {
        total_members: new_friends + regular_members,
        new_friends,
        regular_members,
        role_breakdown,
    }
}

/// `(year, month)` pairs for the last `months` calendar months ending with
/// the month of `now`, oldest first.
fn month_window(now: DateTime<Utc>, months: u32) -> Vec<(i32, u32)> {
    let current = now.year() * 12 + now.month0() as i32;
    (0..months as i32)
        .rev()
        .map(|back| {
            let index = current - back;
            (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
        })
        .collect()
}

/// Bucket join dates into the last `months` calendar months.
pub fn monthly_growth(now: DateTime<Utc>, joined: &[DateTime<Utc>], months: u32) -> Vec<MonthlyGrowth> {
    month_window(now, months)
        .into_iter()
        .map(|(year, month)| MonthlyGrowth {
            month: format!("{} {}", MONTH_NAMES[(month - 1) as usize], year),
            new_members: joined
                .iter()
                .filter(|at| at.year() == year && at.month() == month)
                .count() as u64,
        })
        .collect()
}

/// Start of the earliest month covered by `monthly_growth`.
fn growth_start(now: DateTime<Utc>, months: u32) -> AppResult<DateTime<Utc>> {
    let (year, month) = month_window(now, months)
        .first()
        .copied()
        .unwrap_or((now.year(), now.month()));
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| AppError::internal("Invalid growth window start"))
}

pub fn group_statistics(by_type: &[(GroupType, u64)], members_in_groups: u64) -> GroupStatistics {
    let count_of = |kind: GroupType| -> u64 {
        by_type
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, count)| *count)
            .sum()
    };
    let total_groups = count_of(GroupType::Care) + count_of(GroupType::Ministry);
    let average_group_size = if total_groups == 0 {
        0.0
    } else {
        ((members_in_groups as f64 / total_groups as f64) * 10.0).round() / 10.0
    };

    GroupStatistics {
        total_groups,
        care_groups: count_of(GroupType::Care),
        ministry_groups: count_of(GroupType::Ministry),
        members_in_groups,
        average_group_size,
    }
}

pub struct Reporter<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> Reporter<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn build_dashboard(&self, principal: &Principal, scope: Option<Uuid>) -> AppResult<Dashboard> {
        let church = match scope {
            Some(id) => Some(self.uow.churches().find_by_id(id).await?.ok_or_not_found("Church")?),
            None => None,
        };

        let users = self.uow.users();
        let groups = self.uow.groups();
        let (by_role, by_type) =
            parallel::join2(users.count_by_role(scope), groups.count_by_type(scope)).await?;

        let can_view_activity = match scope {
            Some(id) => principal.can(id, Operation::ViewActivity),
            None => principal.is_super_admin(),
        };
        let recent_activity = if can_view_activity {
            self.uow
                .activity()
                .recent(
                    ActivityFilter {
                        church_id: scope,
                        ..ActivityFilter::default()
                    },
                    RECENT_ACTIVITY_LIMIT,
                )
                .await?
        } else {
            Vec::new()
        };

        Ok(Dashboard {
            church,
            counts: member_counts(&by_role),
            active_groups: by_type.iter().map(|(_, count)| *count).sum(),
            recent_activity,
        })
    }

    async fn church_summary(&self, church: Church) -> AppResult<ChurchSummary> {
        let users = self.uow.users();
        let groups = self.uow.groups();
        let (by_role, by_type) = parallel::join2(
            users.count_by_role(Some(church.id)),
            groups.count_by_type(Some(church.id)),
        )
        .await?;

        Ok(ChurchSummary {
            church,
            counts: member_counts(&by_role),
            active_groups: by_type.iter().map(|(_, count)| *count).sum(),
        })
    }
}

#[async_trait]
impl<U: UnitOfWork> ReportService for Reporter<U> {
    async fn dashboard(&self, principal: Principal, church_id: Option<Uuid>) -> AppResult<Dashboard> {
        let scope = principal.scope(church_id, Operation::ViewDashboard)?;
        self.build_dashboard(&principal, scope).await
    }

    async fn dashboard_for_domain(&self, principal: Principal, domain: &str) -> AppResult<Dashboard> {
        let church = self
            .uow
            .churches()
            .find_by_domain(domain)
            .await?
            .ok_or_not_found("Church")?;
        self.dashboard(principal, Some(church.id)).await
    }

    async fn statistics(&self, principal: Principal, church_id: Option<Uuid>) -> AppResult<Statistics> {
        let scope = principal.scope(church_id, Operation::ViewActivity)?;
        let dashboard = self.build_dashboard(&principal, scope).await?;

        let now = Utc::now();
        let groups = self
            .uow
            .groups()
            .list_all(GroupFilter {
                church_id: scope,
                active_only: true,
                ..GroupFilter::default()
            })
            .await?;
        let group_ids = groups.iter().map(|g| g.id).collect();

        let members = self.uow.members();
        let groups_repo = self.uow.groups();
        let users = self.uow.users();
        let activity = self.uow.activity();
        let (occupancy, by_type, joined, actions) = parallel::join4(
            members.count_in_groups(group_ids),
            groups_repo.count_by_type(scope),
            users.joined_since(scope, growth_start(now, GROWTH_MONTHS)?),
            activity.count_by_action(scope, now - Duration::days(ACTIVITY_SUMMARY_DAYS)),
        )
        .await?;

        let members_in_groups = occupancy.iter().map(|(_, count)| *count).sum();
        let mut activity_summary: Vec<ActionCount> = actions
            .into_iter()
            .map(|(action, count)| ActionCount { action, count })
            .collect();
        activity_summary.sort_by(|a, b| b.count.cmp(&a.count).then(a.action.as_str().cmp(b.action.as_str())));

        Ok(Statistics {
            dashboard,
            groups: group_statistics(&by_type, members_in_groups),
            growth: monthly_growth(now, &joined, GROWTH_MONTHS),
            activity_summary,
        })
    }

    async fn overview(&self, principal: Principal) -> AppResult<Vec<ChurchSummary>> {
        authorize(&principal, principal.church_id, Operation::ManageChurches)?;

        let churches = self.uow.churches().list(true).await?;
        let summaries = churches
            .into_iter()
            .map(|church| self.church_summary(church))
            .collect();
        parallel::join_all(summaries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_counts_exclude_staff() {
        let counts = member_counts(&[
            (RoleCode::SuperAdmin, 1),
            (RoleCode::Admin, 2),
            (RoleCode::NewFriend, 5),
            (RoleCode::Cm, 6),
            (RoleCode::Cl, 3),
        ]);

        assert_eq!(counts.total_members, 14);
        assert_eq!(counts.new_friends, 5);
        assert_eq!(counts.regular_members, 9);
        assert_eq!(counts.role_breakdown.len(), 4);

        let cm = counts
            .role_breakdown
            .iter()
            .find(|b| b.role == RoleCode::Cm)
            .unwrap();
        assert_eq!(cm.percentage, 66.7);
        let vsl = counts
            .role_breakdown
            .iter()
            .find(|b| b.role == RoleCode::Vsl)
            .unwrap();
        assert_eq!(vsl.count, 0);
        assert_eq!(vsl.percentage, 0.0);
    }

    #[test]
    fn test_monthly_growth_spans_year_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).unwrap();
        let joined = vec![
            Utc.with_ymd_and_hms(2025, 9, 3, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 12, 24, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap(),
        ];

        let growth = monthly_growth(now, &joined, 6);
        let months: Vec<&str> = growth.iter().map(|g| g.month.as_str()).collect();
        assert_eq!(
            months,
            vec![
                "September 2025",
                "October 2025",
                "November 2025",
                "December 2025",
                "January 2026",
                "February 2026"
            ]
        );
        let counts: Vec<u64> = growth.iter().map(|g| g.new_members).collect();
        assert_eq!(counts, vec![1, 0, 0, 1, 0, 2]);
    }

    #[test]
    fn test_growth_start_is_first_of_month() {
        let now = Utc.with_ymd_and_hms(2026, 3, 20, 8, 30, 0).unwrap();
        let start = growth_start(now, 6).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_group_statistics_average() {
        let stats = group_statistics(&[(GroupType::Care, 2), (GroupType::Ministry, 1)], 10);
        assert_eq!(stats.total_groups, 3);
        assert_eq!(stats.care_groups, 2);
        assert_eq!(stats.average_group_size, 3.3);

        let empty = group_statistics(&[], 0);
        assert_eq!(empty.average_group_size, 0.0);
    }
}
