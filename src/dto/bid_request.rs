use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidRequest {
    pub event_id: Uuid,
    pub player_id: Uuid,
    pub amount: i64,
}
