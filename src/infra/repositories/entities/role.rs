//! Role database entity for SeaORM.

use sea_orm::entity::prelude::*;

use super::parse_column;
use crate::domain::{Role, RoleCode};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    pub permission_level: i32,
    pub description: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Role {
    fn from(model: Model) -> Self {
        Role {
            code: parse_column(&model.code, RoleCode::NewFriend, "roles.code"),
            permission_level: model.permission_level,
            description: model.description,
        }
    }
}
