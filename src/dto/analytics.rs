use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamAnalytics {
    pub team_id: Uuid,
    pub team_name: String,
    pub total_spent: i64,
    pub players_acquired: i32,
    pub remaining_budget: i64,
    pub category_distribution: HashMap<Uuid, i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionAnalytics {
    pub event_id: Uuid,
    pub total_players: usize,
    pub sold_players: usize,
    pub unsold_players: usize,
    pub total_amount_spent: i64,
    pub highest_bid: i64,
    pub average_price: f64,
    pub teams: Vec<TeamAnalytics>,
}
