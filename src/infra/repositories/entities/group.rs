//! Group database entity for SeaORM.

use sea_orm::entity::prelude::*;

use super::parse_column;
use crate::domain::{Group, GroupType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub church_id: Uuid,
    pub name: String,
    pub group_type: String,
    pub leader_id: Option<Uuid>,
    pub capacity: i32,
    pub meeting_time: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Group {
    fn from(model: Model) -> Self {
        Group {
            id: model.id,
            church_id: model.church_id,
            name: model.name,
            group_type: parse_column(&model.group_type, GroupType::Care, "groups.group_type"),
            leader_id: model.leader_id,
            capacity: model.capacity,
            meeting_time: model.meeting_time,
            description: model.description,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}
