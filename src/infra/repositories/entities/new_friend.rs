//! New friend profile entity for SeaORM.

use sea_orm::entity::prelude::*;

use super::parse_column;
use crate::domain::{FollowUpStatus, NewFriend, TimerStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "new_friends")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub timer_status: i16,
    pub follow_up_status: String,
    pub follow_up_notes: Option<String>,
    pub last_follow_up: Option<DateTimeUtc>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub registered_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for NewFriend {
    fn from(model: Model) -> Self {
        let timer_status = u8::try_from(model.timer_status)
            .ok()
            .and_then(|v| TimerStatus::new(v).ok())
            .unwrap_or(TimerStatus::FIRST);

        NewFriend {
            user_id: model.user_id,
            timer_status,
            follow_up_status: parse_column(
                &model.follow_up_status,
                FollowUpStatus::Pending,
                "new_friends.follow_up_status",
            ),
            follow_up_notes: model.follow_up_notes,
            last_follow_up: model.last_follow_up,
            source: model.source,
            notes: model.notes,
            registered_at: model.registered_at,
        }
    }
}

impl From<NewFriend> for ActiveModel {
    fn from(profile: NewFriend) -> Self {
        use sea_orm::Set;

        ActiveModel {
            user_id: Set(profile.user_id),
            timer_status: Set(i16::from(profile.timer_status.value())),
            follow_up_status: Set(profile.follow_up_status.as_str().to_string()),
            follow_up_notes: Set(profile.follow_up_notes),
            last_follow_up: Set(profile.last_follow_up),
            source: Set(profile.source),
            notes: Set(profile.notes),
            registered_at: Set(profile.registered_at),
        }
    }
}
