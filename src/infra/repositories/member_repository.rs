//! New friend and regular member profile repository.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::new_friend::{self, Entity as NewFriendEntity};
use super::entities::regular_member::{self, Entity as RegularMemberEntity};
use crate::domain::{NewFriend, RegularMember};
use crate::errors::{AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Member profile repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn find_new_friend(&self, user_id: Uuid) -> AppResult<Option<NewFriend>>;

    async fn find_regular(&self, user_id: Uuid) -> AppResult<Option<RegularMember>>;

    async fn new_friends_for(&self, user_ids: Vec<Uuid>) -> AppResult<Vec<NewFriend>>;

    async fn regulars_for(&self, user_ids: Vec<Uuid>) -> AppResult<Vec<RegularMember>>;

    /// Regular members currently assigned to the group
    async fn group_members(&self, group_id: Uuid) -> AppResult<Vec<RegularMember>>;

    async fn create_new_friend(&self, profile: NewFriend) -> AppResult<NewFriend>;

    /// Persist every field of an existing new friend profile
    async fn save_new_friend(&self, profile: NewFriend) -> AppResult<NewFriend>;

    /// Returns true when a profile existed
    async fn delete_new_friend(&self, user_id: Uuid) -> AppResult<bool>;

    async fn create_regular(&self, profile: RegularMember) -> AppResult<RegularMember>;

    async fn save_regular(&self, profile: RegularMember) -> AppResult<RegularMember>;

    async fn delete_regular(&self, user_id: Uuid) -> AppResult<bool>;

    /// Assign the member to a group, or clear the assignment with `None`
    async fn set_group(&self, user_id: Uuid, group_id: Option<Uuid>) -> AppResult<RegularMember>;

    async fn count_in_group(&self, group_id: Uuid) -> AppResult<u64>;

    /// Member counts for the given groups; groups with no members are absent
    async fn count_in_groups(&self, group_ids: Vec<Uuid>) -> AppResult<Vec<(Uuid, u64)>>;
}

/// Profile queries over any connection (pool or open transaction)
pub struct MemberQueries<'c, C: ConnectionTrait> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> MemberQueries<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_new_friend(&self, user_id: Uuid) -> AppResult<Option<NewFriend>> {
        let model = NewFriendEntity::find_by_id(user_id).one(self.conn).await?;
        Ok(model.map(NewFriend::from))
    }

    pub async fn find_regular(&self, user_id: Uuid) -> AppResult<Option<RegularMember>> {
        let model = RegularMemberEntity::find_by_id(user_id).one(self.conn).await?;
        Ok(model.map(RegularMember::from))
    }

    pub async fn new_friends_for(&self, user_ids: Vec<Uuid>) -> AppResult<Vec<NewFriend>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = NewFriendEntity::find()
            .filter(new_friend::Column::UserId.is_in(user_ids))
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(NewFriend::from).collect())
    }

    pub async fn regulars_for(&self, user_ids: Vec<Uuid>) -> AppResult<Vec<RegularMember>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = RegularMemberEntity::find()
            .filter(regular_member::Column::UserId.is_in(user_ids))
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(RegularMember::from).collect())
    }

    pub async fn group_members(&self, group_id: Uuid) -> AppResult<Vec<RegularMember>> {
        let models = RegularMemberEntity::find()
            .filter(regular_member::Column::GroupId.eq(group_id))
            .order_by_asc(regular_member::Column::JoinedAt)
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(RegularMember::from).collect())
    }

    pub async fn create_new_friend(&self, profile: NewFriend) -> AppResult<NewFriend> {
        let active: new_friend::ActiveModel = profile.into();
        let model = active.insert(self.conn).await?;
        Ok(NewFriend::from(model))
    }

    pub async fn save_new_friend(&self, profile: NewFriend) -> AppResult<NewFriend> {
        self.find_new_friend(profile.user_id)
            .await?
            .ok_or_not_found("New friend profile")?;

        let active: new_friend::ActiveModel = profile.into();
        let model = active.update(self.conn).await?;
        Ok(NewFriend::from(model))
    }

    pub async fn delete_new_friend(&self, user_id: Uuid) -> AppResult<bool> {
        let result = NewFriendEntity::delete_by_id(user_id).exec(self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn create_regular(&self, profile: RegularMember) -> AppResult<RegularMember> {
        let active: regular_member::ActiveModel = profile.into();
        let model = active.insert(self.conn).await?;
        Ok(RegularMember::from(model))
    }

    pub async fn save_regular(&self, profile: RegularMember) -> AppResult<RegularMember> {
        self.find_regular(profile.user_id)
            .await?
            .ok_or_not_found("Member profile")?;

        let active: regular_member::ActiveModel = profile.into();
        let model = active.update(self.conn).await?;
        Ok(RegularMember::from(model))
    }

    pub async fn delete_regular(&self, user_id: Uuid) -> AppResult<bool> {
        let result = RegularMemberEntity::delete_by_id(user_id).exec(self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn set_group(&self, user_id: Uuid, group_id: Option<Uuid>) -> AppResult<RegularMember> {
        let model = RegularMemberEntity::find_by_id(user_id)
            .one(self.conn)
            .await?
            .ok_or_not_found("Member profile")?;

        let mut active: regular_member::ActiveModel = model.into();
        active.group_id = Set(group_id);

        let model = active.update(self.conn).await?;
        Ok(RegularMember::from(model))
    }

    pub async fn count_in_group(&self, group_id: Uuid) -> AppResult<u64> {
        let total = RegularMemberEntity::find()
            .filter(regular_member::Column::GroupId.eq(group_id))
            .count(self.conn)
            .await?;
        Ok(total)
    }

    pub async fn count_in_groups(&self, group_ids: Vec<Uuid>) -> AppResult<Vec<(Uuid, u64)>> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<(Option<Uuid>, i64)> = RegularMemberEntity::find()
            .select_only()
            .column(regular_member::Column::GroupId)
            .column_as(Expr::col(regular_member::Column::UserId).count(), "total")
            .filter(regular_member::Column::GroupId.is_in(group_ids))
            .group_by(regular_member::Column::GroupId)
            .into_tuple()
            .all(self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(group_id, total)| group_id.map(|id| (id, total.max(0) as u64)))
            .collect())
    }
}

/// Concrete implementation of MemberRepository
pub struct MemberStore {
    db: DatabaseConnection,
}

impl MemberStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn queries(&self) -> MemberQueries<'_, DatabaseConnection> {
        MemberQueries::new(&self.db)
    }
}

#[async_trait]
impl MemberRepository for MemberStore {
    async fn find_new_friend(&self, user_id: Uuid) -> AppResult<Option<NewFriend>> {
        self.queries().find_new_friend(user_id).await
    }

    async fn find_regular(&self, user_id: Uuid) -> AppResult<Option<RegularMember>> {
        self.queries().find_regular(user_id).await
    }

    async fn new_friends_for(&self, user_ids: Vec<Uuid>) -> AppResult<Vec<NewFriend>> {
        self.queries().new_friends_for(user_ids).await
    }

    async fn regulars_for(&self, user_ids: Vec<Uuid>) -> AppResult<Vec<RegularMember>> {
        self.queries().regulars_for(user_ids).await
    }

    async fn group_members(&self, group_id: Uuid) -> AppResult<Vec<RegularMember>> {
        self.queries().group_members(group_id).await
    }

    async fn create_new_friend(&self, profile: NewFriend) -> AppResult<NewFriend> {
        self.queries().create_new_friend(profile).await
    }

    async fn save_new_friend(&self, profile: NewFriend) -> AppResult<NewFriend> {
        self.queries().save_new_friend(profile).await
    }

    async fn delete_new_friend(&self, user_id: Uuid) -> AppResult<bool> {
        self.queries().delete_new_friend(user_id).await
    }

    async fn create_regular(&self, profile: RegularMember) -> AppResult<RegularMember> {
        self.queries().create_regular(profile).await
    }

    async fn save_regular(&self, profile: RegularMember) -> AppResult<RegularMember> {
        self.queries().save_regular(profile).await
    }

    async fn delete_regular(&self, user_id: Uuid) -> AppResult<bool> {
        self.queries().delete_regular(user_id).await
    }

    async fn set_group(&self, user_id: Uuid, group_id: Option<Uuid>) -> AppResult<RegularMember> {
        self.queries().set_group(user_id, group_id).await
    }

    async fn count_in_group(&self, group_id: Uuid) -> AppResult<u64> {
        self.queries().count_in_group(group_id).await
    }

    async fn count_in_groups(&self, group_ids: Vec<Uuid>) -> AppResult<Vec<(Uuid, u64)>> {
        self.queries().count_in_groups(group_ids).await
    }
}
