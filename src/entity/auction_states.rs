use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Live auction state, one row per event, keyed by the event id.
///
/// `bid_history` is a bounded JSON snapshot of the most recent bids (newest
/// last, capped at 10); the authoritative audit trail lives in the `bids`
/// table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auction_states")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub event_id: Uuid,
    pub current_player_id: Option<Uuid>,
    pub current_bid: Option<i64>,
    pub current_team_id: Option<Uuid>,
    pub current_team_name: Option<String>,
    pub timer_started_at: Option<DateTimeWithTimeZone>,
    pub timer_duration: i32,
    pub status: super::events::AuctionStatus,
    pub bid_history: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::events::Entity",
        from = "Column::EventId",
        to = "super::events::Column::Id"
    )]
    Event,
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
