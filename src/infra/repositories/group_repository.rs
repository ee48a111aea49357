//! Group repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::group::{self, ActiveModel, Entity as GroupEntity};
use super::entities::parse_column;
use crate::domain::{Group, GroupFilter, GroupType, NewGroup};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Group repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Group>>;

    /// Case-insensitive name lookup within one church
    async fn find_by_name(&self, church_id: Uuid, name: &str) -> AppResult<Option<Group>>;

    /// Create a group; names are unique per church
    async fn create(&self, group: NewGroup) -> AppResult<Group>;

    async fn update_capacity(&self, id: Uuid, capacity: i32) -> AppResult<Group>;

    async fn list(&self, filter: GroupFilter, page: PaginationParams) -> AppResult<(Vec<Group>, u64)>;

    async fn list_all(&self, filter: GroupFilter) -> AppResult<Vec<Group>>;

    /// Number of active groups per type
    async fn count_by_type(&self, church_id: Option<Uuid>) -> AppResult<Vec<(GroupType, u64)>>;
}

fn filter_condition(filter: &GroupFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(church_id) = filter.church_id {
        condition = condition.add(group::Column::ChurchId.eq(church_id));
    }
    if let Some(group_type) = filter.group_type {
        condition = condition.add(group::Column::GroupType.eq(group_type.as_str()));
    }
    if filter.active_only {
        condition = condition.add(group::Column::IsActive.eq(true));
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition
            .add(Expr::expr(Func::lower(Expr::col(group::Column::Name))).like(pattern.as_str()));
    }

    condition
}

/// Group queries over any connection (pool or open transaction)
pub struct GroupQueries<'c, C: ConnectionTrait> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> GroupQueries<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Group>> {
        let model = GroupEntity::find_by_id(id).one(self.conn).await?;
        Ok(model.map(Group::from))
    }

    pub async fn find_by_name(&self, church_id: Uuid, name: &str) -> AppResult<Option<Group>> {
        let model = GroupEntity::find()
            .filter(group::Column::ChurchId.eq(church_id))
            .filter(
                Expr::expr(Func::lower(Expr::col(group::Column::Name)))
                    .eq(name.trim().to_lowercase()),
            )
            .one(self.conn)
            .await?;
        Ok(model.map(Group::from))
    }

    pub async fn create(&self, group: NewGroup) -> AppResult<Group> {
        let name = group.name.trim().to_string();
        if self.find_by_name(group.church_id, &name).await?.is_some() {
            return Err(AppError::duplicate(format!("Group '{}'", name)));
        }

        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            church_id: Set(group.church_id),
            name: Set(name),
            group_type: Set(group.group_type.as_str().to_string()),
            leader_id: Set(group.leader_id),
            capacity: Set(group.capacity),
            meeting_time: Set(group.meeting_time),
            description: Set(group.description),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        };

        let model = active_model.insert(self.conn).await?;
        Ok(Group::from(model))
    }

    pub async fn update_capacity(&self, id: Uuid, capacity: i32) -> AppResult<Group> {
        let model = GroupEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_not_found("Group")?;

        let mut active: ActiveModel = model.into();
        active.capacity = Set(capacity);

        let model = active.update(self.conn).await?;
        Ok(Group::from(model))
    }

    pub async fn list(&self, filter: GroupFilter, page: PaginationParams) -> AppResult<(Vec<Group>, u64)> {
        let paginator = GroupEntity::find()
            .filter(filter_condition(&filter))
            .order_by_asc(group::Column::Name)
            .paginate(self.conn, page.limit());

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.page.saturating_sub(1)).await?;
        Ok((models.into_iter().map(Group::from).collect(), total))
    }

    pub async fn list_all(&self, filter: GroupFilter) -> AppResult<Vec<Group>> {
        let models = GroupEntity::find()
            .filter(filter_condition(&filter))
            .order_by_asc(group::Column::Name)
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(Group::from).collect())
    }

    pub async fn count_by_type(&self, church_id: Option<Uuid>) -> AppResult<Vec<(GroupType, u64)>> {
        let mut query = GroupEntity::find()
            .select_only()
            .column(group::Column::GroupType)
            .column_as(Expr::col(group::Column::Id).count(), "total")
            .filter(group::Column::IsActive.eq(true))
            .group_by(group::Column::GroupType);
        if let Some(church_id) = church_id {
            query = query.filter(group::Column::ChurchId.eq(church_id));
        }

        let rows: Vec<(String, i64)> = query.into_tuple().all(self.conn).await?;
        Ok(rows
            .into_iter()
            .map(|(kind, total)| {
                (
                    parse_column(&kind, GroupType::Care, "groups.group_type"),
                    total.max(0) as u64,
                )
            })
            .collect())
    }
}

/// Concrete implementation of GroupRepository
pub struct GroupStore {
    db: DatabaseConnection,
}

impl GroupStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn queries(&self) -> GroupQueries<'_, DatabaseConnection> {
        GroupQueries::new(&self.db)
    }
}

#[async_trait]
impl GroupRepository for GroupStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Group>> {
        self.queries().find_by_id(id).await
    }

    async fn find_by_name(&self, church_id: Uuid, name: &str) -> AppResult<Option<Group>> {
        self.queries().find_by_name(church_id, name).await
    }

    async fn create(&self, group: NewGroup) -> AppResult<Group> {
        self.queries().create(group).await
    }

    async fn update_capacity(&self, id: Uuid, capacity: i32) -> AppResult<Group> {
        self.queries().update_capacity(id, capacity).await
    }

    async fn list(&self, filter: GroupFilter, page: PaginationParams) -> AppResult<(Vec<Group>, u64)> {
        self.queries().list(filter, page).await
    }

    async fn list_all(&self, filter: GroupFilter) -> AppResult<Vec<Group>> {
        self.queries().list_all(filter).await
    }

    async fn count_by_type(&self, church_id: Option<Uuid>) -> AppResult<Vec<(GroupType, u64)>> {
        self.queries().count_by_type(church_id).await
    }
}
