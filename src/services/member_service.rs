//! Member service - member listings, new friend tracking and role changes.
//!
//! Every entry point goes through the access control resolver before it
//! reads or writes. Mutations run in one transaction together with their
//! activity log entry.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::config::RECENT_ACTIVITY_LIMIT;
use crate::domain::{
    authorize, authorize_role_assignment, ActivityAction, ActivityFilter, ActivityLog,
    ClientMeta, FollowUpStatus, Group, MemberProfile, NewActivity, NewFriend, Operation,
    Principal, RegularMember, RoleCode, TimerStatus, User, UserFilter, UserResponse,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{TransactionContext, UnitOfWork};
use crate::types::{Paginated, PaginationParams};

/// Query parameters shared by the member listings
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MemberQuery {
    /// Case-insensitive match on name or email
    pub search: Option<String>,
    pub role: Option<RoleCode>,
    /// Super admins only; others are always scoped to their own church
    pub church_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NewFriendEntry {
    pub user: UserResponse,
    pub profile: Option<NewFriend>,
    #[schema(example = "2nd Timer")]
    pub timer_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegularMemberEntry {
    pub user: UserResponse,
    pub profile: Option<RegularMember>,
}

/// Everything shown on a member's page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberDetail {
    pub user: UserResponse,
    #[schema(value_type = Object)]
    pub profile: MemberProfile,
    pub group: Option<Group>,
    pub recent_activity: Vec<ActivityLog>,
}

/// Outcome of a timer status change or an attendance record
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackingUpdate {
    pub user: UserResponse,
    /// Current timer status; absent once the member has been promoted
    pub timer_status: Option<TimerStatus>,
    /// True when this update promoted the new friend to CM
    pub promoted: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FollowUpUpdate {
    pub status: FollowUpStatus,
    pub notes: Option<String>,
}

#[async_trait]
pub trait MemberService: Send + Sync {
    /// Members of the principal's church (or any church for a super admin)
    async fn list_members(&self, principal: Principal, query: MemberQuery, page: PaginationParams) -> AppResult<Paginated<UserResponse>>;

    async fn list_new_friends(&self, principal: Principal, query: MemberQuery, page: PaginationParams) -> AppResult<Paginated<NewFriendEntry>>;

    async fn list_regular_members(&self, principal: Principal, query: MemberQuery, page: PaginationParams) -> AppResult<Paginated<RegularMemberEntry>>;

    /// Member detail; everyone may view their own
    async fn get_member(&self, principal: Principal, id: Uuid) -> AppResult<MemberDetail>;

    /// Set a new friend's timer status. Reaching the final status promotes them.
    async fn update_timer_status(&self, principal: Principal, id: Uuid, status: TimerStatus, client: ClientMeta) -> AppResult<TrackingUpdate>;

    /// Record attendance; a new friend's timer status advances by one.
    async fn record_attendance(&self, principal: Principal, id: Uuid, client: ClientMeta) -> AppResult<TrackingUpdate>;

    async fn update_follow_up(&self, principal: Principal, id: Uuid, update: FollowUpUpdate, client: ClientMeta) -> AppResult<NewFriend>;

    /// Change a member's role, moving their profile extension to match
    async fn change_role(&self, principal: Principal, id: Uuid, role: RoleCode, client: ClientMeta) -> AppResult<UserResponse>;
}

/// Promote a new friend who completed their timers to CM.
async fn promote_new_friend(
    ctx: &TransactionContext<'_>,
    user: &User,
    actor: Uuid,
    client: &ClientMeta,
) -> AppResult<User> {
    ctx.members().delete_new_friend(user.id).await?;
    ctx.members()
        .create_regular(RegularMember::fresh(user.id, RoleCode::Cm))
        .await?;
    let promoted = ctx
        .users()
        .update_role(user.id, RoleCode::Cm, Some(Utc::now()))
        .await?;

    ctx.activity()
        .append(
            NewActivity::new(
                user.id,
                user.church_id,
                ActivityAction::RoleChange,
                format!("{} became a regular member", user.full_name()),
            )
            .with_metadata(json!({
                "from": RoleCode::NewFriend,
                "to": RoleCode::Cm,
                "reason": "timer_complete",
                "performed_by": actor,
            }))
            .with_client(client.clone()),
        )
        .await?;

    tracing::info!(user_id = %user.id, "New friend promoted to CM");
    Ok(promoted)
}

/// Move the profile extension of `user` so it matches `role`.
async fn reconcile_profiles(ctx: &TransactionContext<'_>, user: &User, role: RoleCode) -> AppResult<()> {
    if role.is_new_friend() {
        ctx.members().delete_regular(user.id).await?;
        if ctx.members().find_new_friend(user.id).await?.is_none() {
            ctx.members()
                .create_new_friend(NewFriend::fresh(user.id, None))
                .await?;
        }
    } else if role.is_regular() {
        ctx.members().delete_new_friend(user.id).await?;
        match ctx.members().find_regular(user.id).await? {
            Some(mut profile) => {
                profile.role_type = role;
                ctx.members().save_regular(profile).await?;
            }
            None => {
                ctx.members()
                    .create_regular(RegularMember::fresh(user.id, role))
                    .await?;
            }
        }
    } else {
        ctx.members().delete_new_friend(user.id).await?;
        ctx.members().delete_regular(user.id).await?;
    }
    Ok(())
}

pub struct MemberManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> MemberManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn find_user(&self, id: Uuid) -> AppResult<User> {
        self.uow.users().find_by_id(id).await?.ok_or_not_found("Member")
    }

    /// Load a member the principal may track, requiring a new friend
    async fn trackable_new_friend(&self, principal: &Principal, id: Uuid) -> AppResult<User> {
        let user = self.find_user(id).await?;
        authorize(principal, user.church_id, Operation::TrackNewFriends)?;
        if !user.role.is_new_friend() {
            return Err(AppError::validation(format!(
                "{} is not a new friend",
                user.full_name()
            )));
        }
        Ok(user)
    }

    fn filter_for(principal: &Principal, query: &MemberQuery, roles: &[RoleCode]) -> AppResult<UserFilter> {
        let church_id = principal.scope(query.church_id, Operation::ViewMembers)?;
        let roles = match query.role {
            Some(role) if roles.is_empty() || roles.contains(&role) => vec![role],
            Some(role) => {
                return Err(AppError::validation(format!("{} is not valid for this listing", role)))
            }
            None => roles.to_vec(),
        };
        Ok(UserFilter {
            church_id,
            ..UserFilter::default()
        }
        .with_roles(&roles)
        .with_search(query.search.clone()))
    }

    async fn load_profile(&self, user: &User) -> AppResult<MemberProfile> {
        let profile = if user.role.is_new_friend() {
            self.uow
                .members()
                .find_new_friend(user.id)
                .await?
                .map(MemberProfile::NewFriend)
        } else if user.role.is_regular() {
            self.uow
                .members()
                .find_regular(user.id)
                .await?
                .map(MemberProfile::Regular)
        } else {
            None
        };
        Ok(profile.unwrap_or(MemberProfile::Staff))
    }
}

#[async_trait]
impl<U: UnitOfWork> MemberService for MemberManager<U> {
    async fn list_members(&self, principal: Principal, query: MemberQuery, page: PaginationParams) -> AppResult<Paginated<UserResponse>> {
        let filter = Self::filter_for(&principal, &query, &[])?;
        let (users, total) = self.uow.users().list(filter, page.clone()).await?;
        let data = users.into_iter().map(UserResponse::from).collect();
        Ok(Paginated::new(data, page.page, page.limit(), total))
    }

    async fn list_new_friends(&self, principal: Principal, query: MemberQuery, page: PaginationParams) -> AppResult<Paginated<NewFriendEntry>> {
        let filter = Self::filter_for(&principal, &query, &[RoleCode::NewFriend])?;
        let (users, total) = self.uow.users().list(filter, page.clone()).await?;

        let ids = users.iter().map(|u| u.id).collect();
        let mut profiles: HashMap<Uuid, NewFriend> = self
            .uow
            .members()
            .new_friends_for(ids)
            .await?
            .into_iter()
            .map(|p| (p.user_id, p))
            .collect();

        let data = users
            .into_iter()
            .map(|user| {
                let profile = profiles.remove(&user.id);
                NewFriendEntry {
                    timer_label: profile.as_ref().map(|p| p.timer_status.label()),
                    profile,
                    user: user.into(),
                }
            })
            .collect();
        Ok(Paginated::new(data, page.page, page.limit(), total))
    }

    async fn list_regular_members(&self, principal: Principal, query: MemberQuery, page: PaginationParams) -> AppResult<Paginated<RegularMemberEntry>> {
        let filter = Self::filter_for(&principal, &query, &RoleCode::REGULAR)?;
        let (users, total) = self.uow.users().list(filter, page.clone()).await?;

        let ids = users.iter().map(|u| u.id).collect();
        let mut profiles: HashMap<Uuid, RegularMember> = self
            .uow
            .members()
            .regulars_for(ids)
            .await?
            .into_iter()
            .map(|p| (p.user_id, p))
            .collect();

        let data = users
            .into_iter()
            .map(|user| RegularMemberEntry {
                profile: profiles.remove(&user.id),
                user: user.into(),
            })
            .collect();
        Ok(Paginated::new(data, page.page, page.limit(), total))
    }

    async fn get_member(&self, principal: Principal, id: Uuid) -> AppResult<MemberDetail> {
        let user = self.find_user(id).await?;
        if principal.user_id != user.id {
            authorize(&principal, user.church_id, Operation::ViewMembers)?;
        }

        let profile = self.load_profile(&user).await?;
        let group = match profile.group_id() {
            Some(group_id) => self.uow.groups().find_by_id(group_id).await?,
            None => None,
        };
        let recent_activity = self
            .uow
            .activity()
            .recent(
                ActivityFilter {
                    user_id: Some(user.id),
                    ..ActivityFilter::default()
                },
                RECENT_ACTIVITY_LIMIT,
            )
            .await?;

        Ok(MemberDetail {
            user: user.into(),
            profile,
            group,
            recent_activity,
        })
    }

    async fn update_timer_status(&self, principal: Principal, id: Uuid, status: TimerStatus, client: ClientMeta) -> AppResult<TrackingUpdate> {
        let user = self.trackable_new_friend(&principal, id).await?;
        let actor = principal.user_id;

        let (user, promoted) = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let mut profile = ctx
                        .members()
                        .find_new_friend(user.id)
                        .await?
                        .ok_or_not_found("New friend profile")?;
                    let previous = profile.timer_status;
                    profile.timer_status = status;
                    ctx.members().save_new_friend(profile).await?;

                    ctx.activity()
                        .append(
                            NewActivity::new(
                                user.id,
                                user.church_id,
                                ActivityAction::StatusChange,
                                format!("{} is now a {}", user.full_name(), status.label()),
                            )
                            .with_metadata(json!({
                                "from": previous,
                                "to": status,
                                "performed_by": actor,
                            }))
                            .with_client(client.clone()),
                        )
                        .await?;

                    if status.is_final() {
                        let promoted = promote_new_friend(&ctx, &user, actor, &client).await?;
                        return Ok((promoted, true));
                    }
                    Ok((user, false))
                })
            })
            .await?;

        Ok(TrackingUpdate {
            user: user.into(),
            timer_status: (!promoted).then_some(status),
            promoted,
        })
    }

    async fn record_attendance(&self, principal: Principal, id: Uuid, client: ClientMeta) -> AppResult<TrackingUpdate> {
        let user = self.find_user(id).await?;
        authorize(&principal, user.church_id, Operation::TrackNewFriends)?;
        let actor = principal.user_id;

        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let now = Utc::now();
                    let user = ctx.users().record_attendance(user.id, now).await?;
                    ctx.activity()
                        .append(
                            NewActivity::new(
                                user.id,
                                user.church_id,
                                ActivityAction::Attendance,
                                format!("{} attended", user.full_name()),
                            )
                            .with_metadata(json!({ "performed_by": actor }))
                            .with_client(client.clone()),
                        )
                        .await?;

                    if !user.role.is_new_friend() {
                        return Ok(TrackingUpdate {
                            user: user.into(),
                            timer_status: None,
                            promoted: false,
                        });
                    }

                    let mut profile = ctx
                        .members()
                        .find_new_friend(user.id)
                        .await?
                        .ok_or_not_found("New friend profile")?;
                    let previous = profile.timer_status;
                    let next = previous.advanced();
                    if next != previous {
                        profile.timer_status = next;
                        ctx.members().save_new_friend(profile).await?;
                        ctx.activity()
                            .append(
                                NewActivity::new(
                                    user.id,
                                    user.church_id,
                                    ActivityAction::StatusChange,
                                    format!("{} is now a {}", user.full_name(), next.label()),
                                )
                                .with_metadata(json!({
                                    "from": previous,
                                    "to": next,
                                    "performed_by": actor,
                                }))
                                .with_client(client.clone()),
                            )
                            .await?;
                    }

                    if next.is_final() {
                        let promoted = promote_new_friend(&ctx, &user, actor, &client).await?;
                        return Ok(TrackingUpdate {
                            user: promoted.into(),
                            timer_status: None,
                            promoted: true,
                        });
                    }

                    Ok(TrackingUpdate {
                        user: user.into(),
                        timer_status: Some(next),
                        promoted: false,
                    })
                })
            })
            .await
    }

    async fn update_follow_up(&self, principal: Principal, id: Uuid, update: FollowUpUpdate, client: ClientMeta) -> AppResult<NewFriend> {
        let user = self.trackable_new_friend(&principal, id).await?;
        let actor = principal.user_id;

        self.uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let mut profile = ctx
                        .members()
                        .find_new_friend(user.id)
                        .await?
                        .ok_or_not_found("New friend profile")?;
                    profile.follow_up_status = update.status;
                    if let Some(notes) = update.notes.filter(|n| !n.trim().is_empty()) {
                        profile.follow_up_notes = Some(notes);
                    }
                    profile.last_follow_up = Some(Utc::now());
                    let profile = ctx.members().save_new_friend(profile).await?;

                    ctx.activity()
                        .append(
                            NewActivity::new(
                                user.id,
                                user.church_id,
                                ActivityAction::FollowUp,
                                format!("Follow-up for {}: {}", user.full_name(), update.status),
                            )
                            .with_metadata(json!({
                                "status": update.status,
                                "performed_by": actor,
                            }))
                            .with_client(client),
                        )
                        .await?;
                    Ok(profile)
                })
            })
            .await
    }

    async fn change_role(&self, principal: Principal, id: Uuid, role: RoleCode, client: ClientMeta) -> AppResult<UserResponse> {
        let user = self.find_user(id).await?;
        authorize_role_assignment(&principal, user.church_id, role)?;
        if user.role.level() > principal.role.level() {
            return Err(AppError::denied(format!(
                "{} cannot change the role of a {}",
                principal.role, user.role
            )));
        }
        if user.role == role {
            return Ok(user.into());
        }

        let actor = principal.user_id;
        let previous = user.role;

        let updated = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    reconcile_profiles(&ctx, &user, role).await?;

                    let transition = (previous.is_new_friend() && role.is_regular()).then(Utc::now);
                    let updated = ctx.users().update_role(user.id, role, transition).await?;

                    ctx.activity()
                        .append(
                            NewActivity::new(
                                user.id,
                                user.church_id,
                                ActivityAction::RoleChange,
                                format!("{} changed from {} to {}", user.full_name(), previous, role),
                            )
                            .with_metadata(json!({
                                "from": previous,
                                "to": role,
                                "performed_by": actor,
                            }))
                            .with_client(client),
                        )
                        .await?;
                    Ok(updated)
                })
            })
            .await?;

        tracing::info!(user_id = %updated.id, from = %previous, to = %role, "Role changed");
        Ok(updated.into())
    }
}
