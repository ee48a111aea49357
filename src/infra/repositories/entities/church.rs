//! Church database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::Church;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "churches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub domain: String,
    pub location: String,
    pub region: String,
    pub is_active: bool,
    pub allow_public_registration: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Church {
    fn from(model: Model) -> Self {
        Church {
            id: model.id,
            name: model.name,
            domain: model.domain,
            location: model.location,
            region: model.region,
            is_active: model.is_active,
            allow_public_registration: model.allow_public_registration,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
