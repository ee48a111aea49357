//! Group service - group registry and membership.
//!
//! Joining a group runs in a serializable transaction so the capacity check
//! and the assignment cannot interleave with a concurrent join.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::config::{DEFAULT_GROUP_CAPACITY, RECENT_ACTIVITY_LIMIT};
use crate::domain::{
    authorize, validate_capacity, ActivityAction, ActivityFilter, ActivityLog, ClientMeta, Group,
    GroupFilter, GroupOccupancy, GroupType, NewActivity, NewGroup, Operation, Principal,
    UserResponse,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GroupQuery {
    /// Case-insensitive match on the group name
    pub search: Option<String>,
    pub group_type: Option<GroupType>,
    /// Super admins only; others are always scoped to their own church
    pub church_id: Option<Uuid>,
}

/// Request to create a group
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateGroup {
    #[validate(length(min = 1, max = 100, message = "Group name is required"))]
    #[schema(example = "Kasiglahan Youth Care")]
    pub name: String,
    pub group_type: GroupType,
    pub leader_id: Option<Uuid>,
    /// Defaults to 12
    #[schema(example = 12)]
    pub capacity: Option<i32>,
    #[schema(example = "Saturdays 4PM")]
    pub meeting_time: Option<String>,
    pub description: Option<String>,
    /// Super admins may create groups in another church
    pub church_id: Option<Uuid>,
}

/// A group with its current fill level
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GroupSummary {
    pub group: Group,
    pub occupancy: GroupOccupancy,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GroupDetail {
    pub group: Group,
    pub leader: Option<UserResponse>,
    pub members: Vec<UserResponse>,
    pub occupancy: GroupOccupancy,
    pub recent_activity: Vec<ActivityLog>,
}

#[async_trait]
pub trait GroupService: Send + Sync {
    async fn list(&self, principal: Principal, query: GroupQuery, page: PaginationParams) -> AppResult<Paginated<GroupSummary>>;

    async fn get(&self, principal: Principal, id: Uuid) -> AppResult<GroupDetail>;

    async fn create(&self, principal: Principal, input: CreateGroup) -> AppResult<GroupSummary>;

    /// Change capacity; it cannot drop below the current member count
    async fn update_capacity(&self, principal: Principal, id: Uuid, capacity: i32) -> AppResult<GroupSummary>;

    /// Put a regular member in the group
    async fn add_member(&self, principal: Principal, group_id: Uuid, user_id: Uuid, client: ClientMeta) -> AppResult<GroupOccupancy>;

    /// Take a member out of the group
    async fn remove_member(&self, principal: Principal, group_id: Uuid, user_id: Uuid, client: ClientMeta) -> AppResult<GroupOccupancy>;
}

pub struct GroupManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> GroupManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn find_group(&self, id: Uuid) -> AppResult<Group> {
        self.uow.groups().find_by_id(id).await?.ok_or_not_found("Group")
    }
}

#[async_trait]
impl<U: UnitOfWork> GroupService for GroupManager<U> {
    async fn list(&self, principal: Principal, query: GroupQuery, page: PaginationParams) -> AppResult<Paginated<GroupSummary>> {
        let church_id = principal.scope(query.church_id, Operation::ViewGroups)?;
        let filter = GroupFilter {
            church_id,
            group_type: query.group_type,
            search: query.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            active_only: false,
        };

        let (groups, total) = self.uow.groups().list(filter, page.clone()).await?;
        let ids = groups.iter().map(|g| g.id).collect();
        let counts: HashMap<Uuid, u64> = self
            .uow
            .members()
            .count_in_groups(ids)
            .await?
            .into_iter()
            .collect();

        let data = groups
            .into_iter()
            .map(|group| GroupSummary {
                occupancy: group.occupancy(counts.get(&group.id).copied().unwrap_or(0)),
                group,
            })
            .collect();
        Ok(Paginated::new(data, page.page, page.limit(), total))
    }

    async fn get(&self, principal: Principal, id: Uuid) -> AppResult<GroupDetail> {
        let group = self.find_group(id).await?;
        authorize(&principal, group.church_id, Operation::ViewGroups)?;

        let roster = self.uow.members().group_members(group.id).await?;
        let member_ids: Vec<Uuid> = roster.iter().map(|m| m.user_id).collect();
        let members = self.uow.users().find_many(member_ids.clone()).await?;

        let leader = match group.leader_id {
            Some(leader_id) => self.uow.users().find_by_id(leader_id).await?,
            None => None,
        };

        let recent_activity = if member_ids.is_empty() {
            Vec::new()
        } else {
            self.uow
                .activity()
                .recent(
                    ActivityFilter {
                        church_id: Some(group.church_id),
                        user_ids: member_ids,
                        ..ActivityFilter::default()
                    },
                    RECENT_ACTIVITY_LIMIT,
                )
                .await?
        };

        Ok(GroupDetail {
            occupancy: group.occupancy(members.len() as u64),
            group,
            leader: leader.map(UserResponse::from),
            members: members.into_iter().map(UserResponse::from).collect(),
            recent_activity,
        })
    }

    async fn create(&self, principal: Principal, input: CreateGroup) -> AppResult<GroupSummary> {
        let church_id = input.church_id.unwrap_or(principal.church_id);
        authorize(&principal, church_id, Operation::ManageGroups)?;

        let capacity = input.capacity.unwrap_or(DEFAULT_GROUP_CAPACITY);
        validate_capacity(capacity)?;

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Group name is required"));
        }

        if let Some(leader_id) = input.leader_id {
            let leader = self
                .uow
                .users()
                .find_by_id(leader_id)
                .await?
                .ok_or_not_found("Leader")?;
            if leader.church_id != church_id {
                return Err(AppError::TenantMismatch);
            }
        }

        let group = self
            .uow
            .groups()
            .create(NewGroup {
                church_id,
                name,
                group_type: input.group_type,
                leader_id: input.leader_id,
                capacity,
                meeting_time: input.meeting_time,
                description: input.description,
            })
            .await?;

        tracing::info!(group_id = %group.id, church_id = %church_id, "Group created");
        Ok(GroupSummary {
            occupancy: group.occupancy(0),
            group,
        })
    }

    async fn update_capacity(&self, principal: Principal, id: Uuid, capacity: i32) -> AppResult<GroupSummary> {
        let group = self.find_group(id).await?;
        authorize(&principal, group.church_id, Operation::ManageGroups)?;
        validate_capacity(capacity)?;

        // Serializable like joins: member_count <= capacity holds at commit
        let summary = self
            .uow
            .transaction_serializable(move |ctx| {
                Box::pin(async move {
                    let count = ctx.members().count_in_group(id).await?;
                    if (capacity as u64) < count {
                        return Err(AppError::validation(format!(
                            "Capacity cannot be below the current member count ({})",
                            count
                        )));
                    }

                    let group = ctx.groups().update_capacity(id, capacity).await?;
                    Ok(GroupSummary {
                        occupancy: group.occupancy(count),
                        group,
                    })
                })
            })
            .await?;

        tracing::info!(group_id = %id, capacity, "Group capacity changed");
        Ok(summary)
    }

    async fn add_member(&self, principal: Principal, group_id: Uuid, user_id: Uuid, client: ClientMeta) -> AppResult<GroupOccupancy> {
        let occupancy = self
            .uow
            .transaction_serializable(move |ctx| {
                Box::pin(async move {
                    let group = ctx.groups().find_by_id(group_id).await?.ok_or_not_found("Group")?;
                    authorize(&principal, group.church_id, Operation::ManageGroupMembership)?;

                    let user = ctx.users().find_by_id(user_id).await?.ok_or_not_found("Member")?;
                    if user.church_id != group.church_id {
                        tracing::warn!(
                            user_id = %user.id,
                            group_id = %group.id,
                            "Rejected group join across churches"
                        );
                        return Err(AppError::TenantMismatch);
                    }
                    if !group.is_active {
                        return Err(AppError::validation(format!("{} is not active", group.name)));
                    }

                    let profile = ctx.members().find_regular(user.id).await?.ok_or_else(|| {
                        AppError::validation(format!(
                            "{} is not a regular member and cannot join groups",
                            user.full_name()
                        ))
                    })?;
                    match profile.group_id {
                        Some(current) if current == group.id => {
                            return Err(AppError::duplicate(format!(
                                "{} in {}",
                                user.full_name(),
                                group.name
                            )));
                        }
                        Some(_) => {
                            return Err(AppError::validation(format!(
                                "{} already belongs to another group",
                                user.full_name()
                            )));
                        }
                        None => {}
                    }

                    let count = ctx.members().count_in_group(group.id).await?;
                    if count >= group.capacity.max(0) as u64 {
                        return Err(AppError::CapacityExceeded);
                    }

                    ctx.members().set_group(user.id, Some(group.id)).await?;
                    ctx.activity()
                        .append(
                            NewActivity::new(
                                user.id,
                                group.church_id,
                                ActivityAction::GroupJoin,
                                format!("{} joined {}", user.full_name(), group.name),
                            )
                            .with_metadata(json!({
                                "group_id": group.id,
                                "group_name": group.name,
                                "performed_by": principal.user_id,
                            }))
                            .with_client(client),
                        )
                        .await?;

                    Ok(group.occupancy(count + 1))
                })
            })
            .await?;

        tracing::info!(%group_id, %user_id, members = occupancy.member_count, "Member joined group");
        Ok(occupancy)
    }

    async fn remove_member(&self, principal: Principal, group_id: Uuid, user_id: Uuid, client: ClientMeta) -> AppResult<GroupOccupancy> {
        let occupancy = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let group = ctx.groups().find_by_id(group_id).await?.ok_or_not_found("Group")?;
                    authorize(&principal, group.church_id, Operation::ManageGroupMembership)?;

                    let user = ctx.users().find_by_id(user_id).await?.ok_or_not_found("Member")?;
                    let is_member = ctx
                        .members()
                        .find_regular(user.id)
                        .await?
                        .is_some_and(|profile| profile.group_id == Some(group.id));
                    if !is_member {
                        return Err(AppError::not_found("Group member"));
                    }

                    ctx.members().set_group(user.id, None).await?;
                    ctx.activity()
                        .append(
                            NewActivity::new(
                                user.id,
                                group.church_id,
                                ActivityAction::GroupLeave,
                                format!("{} left {}", user.full_name(), group.name),
                            )
                            .with_metadata(json!({
                                "group_id": group.id,
                                "group_name": group.name,
                                "performed_by": principal.user_id,
                            }))
                            .with_client(client),
                        )
                        .await?;

                    let count = ctx.members().count_in_group(group.id).await?;
                    Ok(group.occupancy(count))
                })
            })
            .await?;

        tracing::info!(%group_id, %user_id, members = occupancy.member_count, "Member left group");
        Ok(occupancy)
    }
}
