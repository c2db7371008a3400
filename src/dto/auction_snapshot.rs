use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry of the bounded bid history kept on the auction state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidHistoryEntry {
    pub bid_id: Uuid,
    pub player_id: Uuid,
    pub team_id: Uuid,
    pub team_name: String,
    pub amount: i64,
    pub timestamp: DateTime<FixedOffset>,
}

/// Read-side view of an event's live auction state. When no state row exists
/// yet, a default `not_started` snapshot is returned instead of an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionSnapshot {
    pub event_id: Uuid,
    pub status: String,
    pub current_player_id: Option<Uuid>,
    pub current_bid: Option<i64>,
    pub current_team_id: Option<Uuid>,
    pub current_team_name: Option<String>,
    pub timer_started_at: Option<DateTime<FixedOffset>>,
    pub timer_duration: i32,
    pub bid_history: Vec<BidHistoryEntry>,
}
