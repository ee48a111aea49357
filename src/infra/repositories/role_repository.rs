//! Role repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryOrder, Set,
};

use super::entities::role::{self, ActiveModel, Entity as RoleEntity};
use crate::domain::{Role, RoleCode};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// All roles, most privileged first
    async fn list(&self) -> AppResult<Vec<Role>>;

    /// Insert the role row if missing. Returns true when it was created.
    async fn ensure(&self, code: RoleCode) -> AppResult<bool>;
}

pub struct RoleQueries<'c, C: ConnectionTrait> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> RoleQueries<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> AppResult<Vec<Role>> {
        let models = RoleEntity::find()
            .order_by_desc(role::Column::PermissionLevel)
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(Role::from).collect())
    }

    pub async fn ensure(&self, code: RoleCode) -> AppResult<bool> {
        let existing = RoleEntity::find_by_id(code.as_str().to_string())
            .one(self.conn)
            .await?;

        match existing {
            Some(model) => {
                // Keep level and description in step with the code table
                if model.permission_level != code.level() || model.description != code.description() {
                    let mut active: ActiveModel = model.into();
                    active.permission_level = Set(code.level());
                    active.description = Set(code.description().to_string());
                    active.update(self.conn).await?;
                }
                Ok(false)
            }
            None => {
                ActiveModel {
                    code: Set(code.as_str().to_string()),
                    permission_level: Set(code.level()),
                    description: Set(code.description().to_string()),
                }
                .insert(self.conn)
                .await?;
                Ok(true)
            }
        }
    }
}

/// Concrete implementation of RoleRepository
pub struct RoleStore {
    db: DatabaseConnection,
}

impl RoleStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleRepository for RoleStore {
    async fn list(&self) -> AppResult<Vec<Role>> {
        RoleQueries::new(&self.db).list().await
    }

    async fn ensure(&self, code: RoleCode) -> AppResult<bool> {
        RoleQueries::new(&self.db).ensure(code).await
    }
}
