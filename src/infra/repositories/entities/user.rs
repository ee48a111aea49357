//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use super::parse_column;
use crate::domain::{RoleCode, User};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub church_id: Uuid,
    pub role_code: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub last_attendance: Option<DateTimeUtc>,
    pub transition_date: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            email: model.email,
            password_hash: model.password_hash,
            first_name: model.first_name,
            last_name: model.last_name,
            church_id: model.church_id,
            // Unknown codes fall back to the least privileged role
            role: parse_column(&model.role_code, RoleCode::NewFriend, "users.role_code"),
            phone_number: model.phone_number,
            is_active: model.is_active,
            last_attendance: model.last_attendance,
            transition_date: model.transition_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
