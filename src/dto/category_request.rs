use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub event_id: Uuid,
    pub name: String,
    pub min_players: i32,
    pub max_players: i32,
    pub base_price: i64,
    pub color: String,
}
