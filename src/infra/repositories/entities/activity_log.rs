//! Activity log entity for SeaORM.

use sea_orm::entity::prelude::*;

use super::parse_column;
use crate::domain::{ActivityAction, ActivityLog};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "activity_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub church_id: Uuid,
    pub action: String,
    pub description: String,
    /// JSON document stored as text
    pub metadata: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ActivityLog {
    fn from(model: Model) -> Self {
        ActivityLog {
            id: model.id,
            user_id: model.user_id,
            church_id: model.church_id,
            action: parse_column(
                &model.action,
                ActivityAction::ProfileUpdate,
                "activity_logs.action",
            ),
            description: model.description,
            metadata: model
                .metadata
                .and_then(|raw| serde_json::from_str(&raw).ok()),
            ip_address: model.ip_address,
            user_agent: model.user_agent,
            timestamp: model.timestamp,
        }
    }
}
