//! User repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::parse_column;
use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{NewUser, RoleCode, User, UserFilter};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by email address (case-insensitive)
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_many(&self, ids: Vec<Uuid>) -> AppResult<Vec<User>>;

    /// Create a new user; fails with DuplicateKey when the email is taken
    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// One page of users matching the filter, newest first, plus the total
    async fn list(&self, filter: UserFilter, page: PaginationParams) -> AppResult<(Vec<User>, u64)>;

    /// Every user matching the filter, ordered by email
    async fn list_all(&self, filter: UserFilter) -> AppResult<Vec<User>>;

    async fn count(&self, filter: UserFilter) -> AppResult<u64>;

    /// Number of users per role, optionally within one church
    async fn count_by_role(&self, church_id: Option<Uuid>) -> AppResult<Vec<(RoleCode, u64)>>;

    /// Creation timestamps of non-staff users created since `since`
    async fn joined_since(&self, church_id: Option<Uuid>, since: DateTime<Utc>) -> AppResult<Vec<DateTime<Utc>>>;

    async fn update_role(&self, id: Uuid, role: RoleCode, transition_date: Option<DateTime<Utc>>) -> AppResult<User>;

    async fn record_attendance(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<User>;
}

fn filter_condition(filter: &UserFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(church_id) = filter.church_id {
        condition = condition.add(user::Column::ChurchId.eq(church_id));
    }
    if !filter.roles.is_empty() {
        condition = condition.add(user::Column::RoleCode.is_in(filter.roles.iter().map(|r| r.as_str())));
    }
    if filter.active_only {
        condition = condition.add(user::Column::IsActive.eq(true));
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(user::Column::FirstName))).like(pattern.as_str()))
                .add(Expr::expr(Func::lower(Expr::col(user::Column::LastName))).like(pattern.as_str()))
                .add(Expr::expr(Func::lower(Expr::col(user::Column::Email))).like(pattern.as_str())),
        );
    }

    condition
}

fn staff_codes() -> impl Iterator<Item = &'static str> {
    RoleCode::ALL
        .into_iter()
        .filter(|r| r.is_staff())
        .map(|r| r.as_str())
}

/// User queries over any connection (pool or open transaction)
pub struct UserQueries<'c, C: ConnectionTrait> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> UserQueries<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let model = UserEntity::find_by_id(id).one(self.conn).await?;
        Ok(model.map(User::from))
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let model = UserEntity::find()
            .filter(user::Column::Email.eq(email.trim().to_ascii_lowercase()))
            .one(self.conn)
            .await?;
        Ok(model.map(User::from))
    }

    pub async fn find_many(&self, ids: Vec<Uuid>) -> AppResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = UserEntity::find()
            .filter(user::Column::Id.is_in(ids))
            .order_by_asc(user::Column::LastName)
            .order_by_asc(user::Column::FirstName)
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    pub async fn create(&self, user: NewUser) -> AppResult<User> {
        let email = user.email.trim().to_ascii_lowercase();
        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::duplicate(format!("User '{}'", email)));
        }

        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(user.password_hash),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            church_id: Set(user.church_id),
            role_code: Set(user.role.as_str().to_string()),
            phone_number: Set(user.phone_number),
            is_active: Set(true),
            last_attendance: Set(None),
            transition_date: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(self.conn).await?;
        Ok(User::from(model))
    }

    pub async fn list(&self, filter: UserFilter, page: PaginationParams) -> AppResult<(Vec<User>, u64)> {
        let paginator = UserEntity::find()
            .filter(filter_condition(&filter))
            .order_by_desc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Email)
            .paginate(self.conn, page.limit());

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.page.saturating_sub(1)).await?;
        Ok((models.into_iter().map(User::from).collect(), total))
    }

    pub async fn list_all(&self, filter: UserFilter) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .filter(filter_condition(&filter))
            .order_by_asc(user::Column::Email)
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    pub async fn count(&self, filter: UserFilter) -> AppResult<u64> {
        let total = UserEntity::find()
            .filter(filter_condition(&filter))
            .count(self.conn)
            .await?;
        Ok(total)
    }

    pub async fn count_by_role(&self, church_id: Option<Uuid>) -> AppResult<Vec<(RoleCode, u64)>> {
        let mut query = UserEntity::find()
            .select_only()
            .column(user::Column::RoleCode)
            .column_as(Expr::col(user::Column::Id).count(), "total")
            .group_by(user::Column::RoleCode);
        if let Some(church_id) = church_id {
            query = query.filter(user::Column::ChurchId.eq(church_id));
        }

        let rows: Vec<(String, i64)> = query.into_tuple().all(self.conn).await?;
        Ok(rows
            .into_iter()
            .map(|(code, total)| {
                (
                    parse_column(&code, RoleCode::NewFriend, "users.role_code"),
                    total.max(0) as u64,
                )
            })
            .collect())
    }

    pub async fn joined_since(&self, church_id: Option<Uuid>, since: DateTime<Utc>) -> AppResult<Vec<DateTime<Utc>>> {
        let mut query = UserEntity::find()
            .select_only()
            .column(user::Column::CreatedAt)
            .filter(user::Column::CreatedAt.gte(since))
            .filter(user::Column::RoleCode.is_not_in(staff_codes()));
        if let Some(church_id) = church_id {
            query = query.filter(user::Column::ChurchId.eq(church_id));
        }

        let rows: Vec<DateTime<Utc>> = query.into_tuple().all(self.conn).await?;
        Ok(rows)
    }

    pub async fn update_role(&self, id: Uuid, role: RoleCode, transition_date: Option<DateTime<Utc>>) -> AppResult<User> {
        let model = UserEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_not_found("User")?;

        let mut active: ActiveModel = model.into();
        active.role_code = Set(role.as_str().to_string());
        if transition_date.is_some() {
            active.transition_date = Set(transition_date);
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(self.conn).await?;
        Ok(User::from(model))
    }

    pub async fn record_attendance(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<User> {
        let model = UserEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_not_found("User")?;

        let mut active: ActiveModel = model.into();
        active.last_attendance = Set(Some(at));
        active.updated_at = Set(Utc::now());

        let model = active.update(self.conn).await?;
        Ok(User::from(model))
    }
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn queries(&self) -> UserQueries<'_, DatabaseConnection> {
        UserQueries::new(&self.db)
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        self.queries().find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.queries().find_by_email(email).await
    }

    async fn find_many(&self, ids: Vec<Uuid>) -> AppResult<Vec<User>> {
        self.queries().find_many(ids).await
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        self.queries().create(user).await
    }

    async fn list(&self, filter: UserFilter, page: PaginationParams) -> AppResult<(Vec<User>, u64)> {
        self.queries().list(filter, page).await
    }

    async fn list_all(&self, filter: UserFilter) -> AppResult<Vec<User>> {
        self.queries().list_all(filter).await
    }

    async fn count(&self, filter: UserFilter) -> AppResult<u64> {
        self.queries().count(filter).await
    }

    async fn count_by_role(&self, church_id: Option<Uuid>) -> AppResult<Vec<(RoleCode, u64)>> {
        self.queries().count_by_role(church_id).await
    }

    async fn joined_since(&self, church_id: Option<Uuid>, since: DateTime<Utc>) -> AppResult<Vec<DateTime<Utc>>> {
        self.queries().joined_since(church_id, since).await
    }

    async fn update_role(&self, id: Uuid, role: RoleCode, transition_date: Option<DateTime<Utc>>) -> AppResult<User> {
        self.queries().update_role(id, role, transition_date).await
    }

    async fn record_attendance(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<User> {
        self.queries().record_attendance(id, at).await
    }
}
