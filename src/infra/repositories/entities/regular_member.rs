//! Regular member profile entity for SeaORM.

use sea_orm::entity::prelude::*;

use super::parse_column;
use crate::domain::{RegularMember, RoleCode};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "regular_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub role_type: String,
    pub group_id: Option<Uuid>,
    pub ministry_involvement: Option<String>,
    pub skills: Option<String>,
    pub joined_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for RegularMember {
    fn from(model: Model) -> Self {
        RegularMember {
            user_id: model.user_id,
            role_type: parse_column(&model.role_type, RoleCode::Cm, "regular_members.role_type"),
            group_id: model.group_id,
            ministry_involvement: model.ministry_involvement,
            skills: model.skills,
            joined_at: model.joined_at,
        }
    }
}

impl From<RegularMember> for ActiveModel {
    fn from(profile: RegularMember) -> Self {
        use sea_orm::Set;

        ActiveModel {
            user_id: Set(profile.user_id),
            role_type: Set(profile.role_type.as_str().to_string()),
            group_id: Set(profile.group_id),
            ministry_involvement: Set(profile.ministry_involvement),
            skills: Set(profile.skills),
            joined_at: Set(profile.joined_at),
        }
    }
}
