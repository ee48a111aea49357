//! Activity log repository. Entries are only ever appended.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::activity_log::{self, ActiveModel, Entity as ActivityEntity};
use super::entities::parse_column;
use crate::domain::{ActivityAction, ActivityFilter, ActivityLog, NewActivity};
use crate::errors::AppResult;
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn append(&self, entry: NewActivity) -> AppResult<ActivityLog>;

    /// One page of entries, newest first
    async fn list(&self, filter: ActivityFilter, page: PaginationParams) -> AppResult<(Vec<ActivityLog>, u64)>;

    async fn list_all(&self, filter: ActivityFilter) -> AppResult<Vec<ActivityLog>>;

    /// The `limit` newest entries
    async fn recent(&self, filter: ActivityFilter, limit: u64) -> AppResult<Vec<ActivityLog>>;

    async fn count_by_action(&self, church_id: Option<Uuid>, since: DateTime<Utc>) -> AppResult<Vec<(ActivityAction, u64)>>;
}

fn filter_condition(filter: &ActivityFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(church_id) = filter.church_id {
        condition = condition.add(activity_log::Column::ChurchId.eq(church_id));
    }
    if let Some(user_id) = filter.user_id {
        condition = condition.add(activity_log::Column::UserId.eq(user_id));
    }
    if !filter.user_ids.is_empty() {
        condition = condition.add(activity_log::Column::UserId.is_in(filter.user_ids.clone()));
    }
    if let Some(action) = filter.action {
        condition = condition.add(activity_log::Column::Action.eq(action.as_str()));
    }
    if let Some(since) = filter.since {
        condition = condition.add(activity_log::Column::Timestamp.gte(since));
    }

    condition
}

pub struct ActivityQueries<'c, C: ConnectionTrait> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> ActivityQueries<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn append(&self, entry: NewActivity) -> AppResult<ActivityLog> {
        let metadata = entry.metadata.as_ref().map(|value| value.to_string());

        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(entry.user_id),
            church_id: Set(entry.church_id),
            action: Set(entry.action.as_str().to_string()),
            description: Set(entry.description),
            metadata: Set(metadata),
            ip_address: Set(entry.client.ip_address),
            user_agent: Set(entry.client.user_agent),
            timestamp: Set(Utc::now()),
        };

        let model = active_model.insert(self.conn).await?;
        tracing::debug!(action = %model.action, user_id = %model.user_id, "Activity recorded");
        Ok(ActivityLog::from(model))
    }

    pub async fn list(&self, filter: ActivityFilter, page: PaginationParams) -> AppResult<(Vec<ActivityLog>, u64)> {
        let paginator = ActivityEntity::find()
            .filter(filter_condition(&filter))
            .order_by_desc(activity_log::Column::Timestamp)
            .paginate(self.conn, page.limit());

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.page.saturating_sub(1)).await?;
        Ok((models.into_iter().map(ActivityLog::from).collect(), total))
    }

    pub async fn list_all(&self, filter: ActivityFilter) -> AppResult<Vec<ActivityLog>> {
        let models = ActivityEntity::find()
            .filter(filter_condition(&filter))
            .order_by_desc(activity_log::Column::Timestamp)
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(ActivityLog::from).collect())
    }

    pub async fn recent(&self, filter: ActivityFilter, limit: u64) -> AppResult<Vec<ActivityLog>> {
        let models = ActivityEntity::find()
            .filter(filter_condition(&filter))
            .order_by_desc(activity_log::Column::Timestamp)
            .limit(limit)
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(ActivityLog::from).collect())
    }

    pub async fn count_by_action(&self, church_id: Option<Uuid>, since: DateTime<Utc>) -> AppResult<Vec<(ActivityAction, u64)>> {
        let mut query = ActivityEntity::find()
            .select_only()
            .column(activity_log::Column::Action)
            .column_as(Expr::col(activity_log::Column::Id).count(), "total")
            .filter(activity_log::Column::Timestamp.gte(since))
            .group_by(activity_log::Column::Action);
        if let Some(church_id) = church_id {
            query = query.filter(activity_log::Column::ChurchId.eq(church_id));
        }

        let rows: Vec<(String, i64)> = query.into_tuple().all(self.conn).await?;
        Ok(rows
            .into_iter()
            .map(|(action, total)| {
                (
                    parse_column(&action, ActivityAction::ProfileUpdate, "activity_logs.action"),
                    total.max(0) as u64,
                )
            })
            .collect())
    }
}

/// Concrete implementation of ActivityRepository
pub struct ActivityStore {
    db: DatabaseConnection,
}

impl ActivityStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn queries(&self) -> ActivityQueries<'_, DatabaseConnection> {
        ActivityQueries::new(&self.db)
    }
}

#[async_trait]
impl ActivityRepository for ActivityStore {
    async fn append(&self, entry: NewActivity) -> AppResult<ActivityLog> {
        self.queries().append(entry).await
    }

    async fn list(&self, filter: ActivityFilter, page: PaginationParams) -> AppResult<(Vec<ActivityLog>, u64)> {
        self.queries().list(filter, page).await
    }

    async fn list_all(&self, filter: ActivityFilter) -> AppResult<Vec<ActivityLog>> {
        self.queries().list_all(filter).await
    }

    async fn recent(&self, filter: ActivityFilter, limit: u64) -> AppResult<Vec<ActivityLog>> {
        self.queries().recent(filter, limit).await
    }

    async fn count_by_action(&self, church_id: Option<Uuid>, since: DateTime<Utc>) -> AppResult<Vec<(ActivityAction, u64)>> {
        self.queries().count_by_action(church_id, since).await
    }
}
