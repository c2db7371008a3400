use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Team ledger. `spent`, `remaining` and `players_count` are caches derived
/// from the set of SOLD players owned by the team; reads reconcile them
/// against that set when they drift.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub budget: i64,
    pub spent: i64,
    pub remaining: i64,
    pub max_squad_size: i32,
    pub players_count: i32,
    pub color: Option<String>,
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
