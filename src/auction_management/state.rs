//! Auction state helpers.
//!
//! Ledger arithmetic, bid-history bounding and snapshot assembly for the
//! auction state machine, plus the shared database helpers the transaction
//! paths lean on (CURRENT-player demotion, owned-player counts, team cache
//! reconciliation).

use sea_orm::prelude::Json;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

use crate::auction_management::error::AuctionError;
use crate::dto::auction_snapshot::{AuctionSnapshot, BidHistoryEntry};
use crate::entity::events::AuctionStatus;
use crate::entity::players::PlayerStatus;
use crate::entity::{auction_states, players, teams};

/// Maximum number of entries kept in the auction-state bid history. A
/// payload-size control; the `bids` table holds the full trail.
pub const BID_HISTORY_CAP: usize = 10;

/// Decode a stored bid history, tolerating malformed payloads.
pub fn parse_history(history: &Json) -> Vec<BidHistoryEntry> {
    serde_json::from_value(history.clone()).unwrap_or_default()
}

/// Append an entry to the bid history, evicting the oldest entries beyond
/// the cap (newest last).
pub fn push_history(history: &Json, entry: BidHistoryEntry) -> Json {
    let mut entries = parse_history(history);
    entries.push(entry);
    let excess = entries.len().saturating_sub(BID_HISTORY_CAP);
    entries.drain(..excess);
    serde_json::to_value(entries).unwrap_or_else(|_| Json::Array(vec![]))
}

/// New team ledger values after buying a player at `price`.
pub fn sale_ledger(budget: i64, spent: i64, players_count: i32, price: i64) -> (i64, i64, i32) {
    let new_spent = spent + price;
    (new_spent, budget - new_spent, players_count + 1)
}

/// New team ledger values after releasing a player bought at `refund`.
///
/// Clamped at zero on both counters: inconsistent data must never drive the
/// ledger negative.
pub fn release_ledger(budget: i64, spent: i64, players_count: i32, refund: i64) -> (i64, i64, i32) {
    let new_spent = (spent - refund).max(0);
    (new_spent, budget - new_spent, (players_count - 1).max(0))
}

/// Build a read-side snapshot, falling back to a default `not_started` view
/// when no state row exists for the event yet.
pub fn snapshot_from(event_id: Uuid, state: Option<&auction_states::Model>) -> AuctionSnapshot {
    match state {
        Some(state) => AuctionSnapshot {
            event_id: state.event_id,
            status: state.status.to_string(),
            current_player_id: state.current_player_id,
            current_bid: state.current_bid,
            current_team_id: state.current_team_id,
            current_team_name: state.current_team_name.clone(),
            timer_started_at: state.timer_started_at,
            timer_duration: state.timer_duration,
            bid_history: parse_history(&state.bid_history),
        },
        None => AuctionSnapshot {
            event_id,
            status: AuctionStatus::NotStarted.to_string(),
            current_player_id: None,
            current_bid: None,
            current_team_id: None,
            current_team_name: None,
            timer_started_at: None,
            timer_duration: 0,
            bid_history: Vec::new(),
        },
    }
}

/// Transition every CURRENT player of the event back to AVAILABLE, except
/// the one being promoted. Runs inside the caller's transaction so the
/// at-most-one-CURRENT invariant holds without a repair window.
pub(crate) async fn demote_current_players(
    event_id: Uuid,
    keep_player_id: Uuid,
    db: &(impl ConnectionTrait + Send),
) -> Result<(), AuctionError> {
    let stale = players::Entity::find()
        .filter(players::Column::EventId.eq(event_id))
        .filter(players::Column::Status.eq(PlayerStatus::Current))
        .filter(players::Column::Id.ne(keep_player_id))
        .all(db)
        .await?;

    for player in stale {
        let mut model: players::ActiveModel = player.into();
        model.status = Set(PlayerStatus::Available);
        model.update(db).await?;
    }
    Ok(())
}

/// Count the SOLD players a team owns, grouped by category.
pub(crate) async fn owned_player_counts(
    team_id: Uuid,
    db: &(impl ConnectionTrait + Send),
) -> Result<HashMap<Uuid, i32>, AuctionError> {
    let owned = players::Entity::find()
        .filter(players::Column::SoldToTeamId.eq(team_id))
        .filter(players::Column::Status.eq(PlayerStatus::Sold))
        .all(db)
        .await?;

    let mut counts: HashMap<Uuid, i32> = HashMap::new();
    for player in owned {
        *counts.entry(player.category_id).or_insert(0) += 1;
    }
    Ok(counts)
}

/// True when any of the cached ledger fields disagrees with the
/// SOLD-player set. `remaining` is checked on its own: it can drift even
/// while `spent` is correct, and it is the field the raw-budget floor
/// trusts.
pub fn caches_drifted(team: &teams::Model, actual_spent: i64, actual_count: i32) -> bool {
    team.spent != actual_spent
        || team.players_count != actual_count
        || team.remaining != team.budget - actual_spent
}

/// Recompute a team's cached `spent`/`remaining`/`players_count` from its
/// SOLD players and persist a correction when the caches drifted. Drift is
/// recoverable; reads never fail because of it.
pub(crate) async fn reconcile_team_caches(
    team: teams::Model,
    db: &(impl ConnectionTrait + Send),
) -> Result<teams::Model, AuctionError> {
    let owned = players::Entity::find()
        .filter(players::Column::SoldToTeamId.eq(team.id))
        .filter(players::Column::Status.eq(PlayerStatus::Sold))
        .all(db)
        .await?;

    let actual_spent: i64 = owned.iter().filter_map(|p| p.sold_price).sum();
    let actual_count = owned.len() as i32;

    if !caches_drifted(&team, actual_spent, actual_count) {
        return Ok(team);
    }

    warn!(
        team_id = %team.id,
        cached_spent = team.spent,
        cached_remaining = team.remaining,
        actual_spent,
        cached_count = team.players_count,
        actual_count,
        "team ledger caches drifted from sold players; correcting"
    );

    let budget = team.budget;
    let mut model: teams::ActiveModel = team.into();
    model.spent = Set(actual_spent);
    model.remaining = Set(budget - actual_spent);
    model.players_count = Set(actual_count);
    let corrected = model.update(db).await?;
    Ok(corrected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(amount: i64) -> BidHistoryEntry {
        BidHistoryEntry {
            bid_id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            team_name: "Team".to_string(),
            amount,
            timestamp: Utc::now().into(),
        }
    }

    #[test]
    fn test_history_caps_at_ten_newest_last() {
        let mut history = Json::Array(vec![]);
        for amount in 1..=15 {
            history = push_history(&history, entry(amount));
        }
        let entries = parse_history(&history);
        assert_eq!(entries.len(), BID_HISTORY_CAP);
        assert_eq!(entries.first().map(|e| e.amount), Some(6));
        assert_eq!(entries.last().map(|e| e.amount), Some(15));
    }

    #[test]
    fn test_history_tolerates_malformed_payload() {
        let garbage = Json::String("not a history".to_string());
        assert!(parse_history(&garbage).is_empty());
        let history = push_history(&garbage, entry(100));
        assert_eq!(parse_history(&history).len(), 1);
    }

    #[test]
    fn test_sale_ledger() {
        let (spent, remaining, count) = sale_ledger(200_000, 120_000, 3, 26_000);
        assert_eq!(spent, 146_000);
        assert_eq!(remaining, 54_000);
        assert_eq!(count, 4);
    }

    #[test]
    fn test_release_ledger_refunds() {
        let (spent, remaining, count) = release_ledger(200_000, 146_000, 4, 26_000);
        assert_eq!(spent, 120_000);
        assert_eq!(remaining, 80_000);
        assert_eq!(count, 3);
    }

    #[test]
    fn test_release_ledger_clamps_at_zero() {
        // Erroneous release on an empty ledger must not go negative.
        let (spent, remaining, count) = release_ledger(200_000, 0, 0, 26_000);
        assert_eq!(spent, 0);
        assert_eq!(remaining, 200_000);
        assert_eq!(count, 0);
    }

    fn team_with_caches(spent: i64, remaining: i64, players_count: i32) -> teams::Model {
        teams::Model {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            name: "Team".to_string(),
            budget: 200_000,
            spent,
            remaining,
            max_squad_size: 18,
            players_count,
            color: None,
        }
    }

    #[test]
    fn test_consistent_caches_not_flagged() {
        let team = team_with_caches(50_000, 150_000, 2);
        assert!(!caches_drifted(&team, 50_000, 2));
    }

    #[test]
    fn test_drift_detected_per_field() {
        // spent wrong
        assert!(caches_drifted(&team_with_caches(40_000, 150_000, 2), 50_000, 2));
        // players_count wrong
        assert!(caches_drifted(&team_with_caches(50_000, 150_000, 3), 50_000, 2));
        // remaining wrong even though spent matches
        assert!(caches_drifted(&team_with_caches(50_000, 160_000, 2), 50_000, 2));
    }

    #[test]
    fn test_default_snapshot_when_state_missing() {
        let event_id = Uuid::new_v4();
        let snapshot = snapshot_from(event_id, None);
        assert_eq!(snapshot.event_id, event_id);
        assert_eq!(snapshot.status, AuctionStatus::NotStarted.to_string());
        assert!(snapshot.current_player_id.is_none());
        assert!(snapshot.bid_history.is_empty());
    }
}
