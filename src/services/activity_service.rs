//! Activity log listing.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::domain::{ActivityAction, ActivityFilter, ActivityLog, Operation, Principal};
use crate::errors::AppResult;
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityQuery {
    pub action: Option<ActivityAction>,
    pub user_id: Option<Uuid>,
    /// Super admins only; others are always scoped to their own church
    pub church_id: Option<Uuid>,
}

#[async_trait]
pub trait ActivityService: Send + Sync {
    /// Newest entries first
    async fn list(&self, principal: Principal, query: ActivityQuery, page: PaginationParams) -> AppResult<Paginated<ActivityLog>>;
}

pub struct ActivityReader<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> ActivityReader<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> ActivityService for ActivityReader<U> {
    async fn list(&self, principal: Principal, query: ActivityQuery, page: PaginationParams) -> AppResult<Paginated<ActivityLog>> {
        let church_id = principal.scope(query.church_id, Operation::ViewActivity)?;
        let filter = ActivityFilter {
            church_id,
            user_id: query.user_id,
            action: query.action,
            ..ActivityFilter::default()
        };

        let (entries, total) = self.uow.activity().list(filter, page.clone()).await?;
        Ok(Paginated::new(entries, page.page, page.limit(), total))
    }
}
