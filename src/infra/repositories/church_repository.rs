//! Church repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::church::{self, ActiveModel, Entity as ChurchEntity};
use crate::domain::{Church, NewChurch};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Church repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ChurchRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Church>>;

    /// Find a church by its (lowercase) domain, active or not
    async fn find_by_domain(&self, domain: &str) -> AppResult<Option<Church>>;

    /// List churches ordered by region then name
    async fn list(&self, active_only: bool) -> AppResult<Vec<Church>>;

    async fn create(&self, church: NewChurch) -> AppResult<Church>;

    async fn update_location(&self, id: Uuid, location: String, region: String) -> AppResult<Church>;

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Church>;
}

/// Church queries over any connection (pool or open transaction)
pub struct ChurchQueries<'c, C: ConnectionTrait> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> ChurchQueries<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Church>> {
        let model = ChurchEntity::find_by_id(id).one(self.conn).await?;
        Ok(model.map(Church::from))
    }

    pub async fn find_by_domain(&self, domain: &str) -> AppResult<Option<Church>> {
        let model = ChurchEntity::find()
            .filter(church::Column::Domain.eq(domain.trim().to_ascii_lowercase()))
            .one(self.conn)
            .await?;
        Ok(model.map(Church::from))
    }

    pub async fn list(&self, active_only: bool) -> AppResult<Vec<Church>> {
        let mut query = ChurchEntity::find();
        if active_only {
            query = query.filter(church::Column::IsActive.eq(true));
        }
        let models = query
            .order_by_asc(church::Column::Region)
            .order_by_asc(church::Column::Name)
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(Church::from).collect())
    }

    pub async fn create(&self, church: NewChurch) -> AppResult<Church> {
        if self.find_by_domain(&church.domain).await?.is_some() {
            return Err(AppError::duplicate(format!("Church '{}'", church.domain)));
        }

        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(church.name),
            domain: Set(church.domain),
            location: Set(church.location),
            region: Set(church.region),
            is_active: Set(true),
            allow_public_registration: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(self.conn).await?;
        Ok(Church::from(model))
    }

    pub async fn update_location(&self, id: Uuid, location: String, region: String) -> AppResult<Church> {
        let model = ChurchEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_not_found("Church")?;

        let mut active: ActiveModel = model.into();
        active.location = Set(location);
        active.region = Set(region);
        active.updated_at = Set(Utc::now());

        let model = active.update(self.conn).await?;
        Ok(Church::from(model))
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Church> {
        let model = ChurchEntity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_not_found("Church")?;

        let mut active: ActiveModel = model.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now());

        let model = active.update(self.conn).await?;
        Ok(Church::from(model))
    }
}

/// Concrete implementation of ChurchRepository
pub struct ChurchStore {
    db: DatabaseConnection,
}

impl ChurchStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn queries(&self) -> ChurchQueries<'_, DatabaseConnection> {
        ChurchQueries::new(&self.db)
    }
}

#[async_trait]
impl ChurchRepository for ChurchStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Church>> {
        self.queries().find_by_id(id).await
    }

    async fn find_by_domain(&self, domain: &str) -> AppResult<Option<Church>> {
        self.queries().find_by_domain(domain).await
    }

    async fn list(&self, active_only: bool) -> AppResult<Vec<Church>> {
        self.queries().list(active_only).await
    }

    async fn create(&self, church: NewChurch) -> AppResult<Church> {
        self.queries().create(church).await
    }

    async fn update_location(&self, id: Uuid, location: String, region: String) -> AppResult<Church> {
        self.queries().update_location(id, location, region).await
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Church> {
        self.queries().set_active(id, is_active).await
    }
}
