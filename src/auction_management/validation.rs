//! Bid validator.
//!
//! Decides whether a proposed bid may be admitted, given the team's
//! financial state and a consistent snapshot of the live auction state.
//! Checks run in a fixed order and short-circuit on the first failure, so
//! every rejection carries exactly one reason.
//!
//! The caller is responsible for snapshot freshness: inside `place_bid`
//! this runs against rows re-read under a row lock, never against state
//! read earlier in the request.

use std::collections::HashMap;
use uuid::Uuid;

use crate::auction_management::budget::{compute_effective_budget, compute_obligations};
use crate::auction_management::error::AuctionError;
use crate::entity::events::AuctionStatus;
use crate::entity::{auction_states, categories, teams};

/// Validate a proposed bid.
///
/// Check order: obligation shortfall, effective budget, raw budget,
/// auction active, player on the block, strictly-higher amount. A
/// configured minimum increment is deliberately not enforced here.
pub fn validate_bid(
    amount: i64,
    player_id: Uuid,
    team: &teams::Model,
    categories: &[categories::Model],
    owned_counts: &HashMap<Uuid, i32>,
    auction_state: Option<&auction_states::Model>,
) -> Result<(), AuctionError> {
    let obligations = compute_obligations(categories, owned_counts);
    let summary = compute_effective_budget(team.budget, team.spent, obligations.total_obligation);

    if !summary.can_bid {
        return Err(AuctionError::ObligationShortfall {
            shortfall: obligations.total_obligation - summary.remaining,
        });
    }

    if amount > summary.effective_budget {
        return Err(AuctionError::ExceedsEffectiveBudget {
            max_bid: summary.effective_budget,
        });
    }

    // Redundant with the effective-budget check in well-formed data, but
    // enforced independently as a hard floor.
    if amount > team.remaining {
        return Err(AuctionError::InsufficientRawBudget {
            remaining: team.remaining,
        });
    }

    let state = match auction_state {
        Some(state) if state.status == AuctionStatus::InProgress => state,
        _ => return Err(AuctionError::AuctionNotActive),
    };

    // The bid must target the player actually on the block; an in-progress
    // auction with an empty block accepts no bids.
    if state.current_player_id != Some(player_id) {
        return Err(AuctionError::PlayerNotOnBlock);
    }

    let current_bid = state.current_bid.unwrap_or(0);
    if amount <= current_bid {
        return Err(AuctionError::BidTooLow { current_bid });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::prelude::Json;

    fn team(budget: i64, spent: i64) -> teams::Model {
        teams::Model {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            name: "Test Team".to_string(),
            budget,
            spent,
            remaining: budget - spent,
            max_squad_size: 18,
            players_count: 0,
            color: None,
        }
    }

    fn category(min_players: i32, base_price: i64) -> categories::Model {
        categories::Model {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            name: "A".to_string(),
            min_players,
            max_players: min_players + 5,
            base_price,
            color: "#ffffff".to_string(),
        }
    }

    fn active_state(current_bid: Option<i64>) -> auction_states::Model {
        auction_states::Model {
            event_id: Uuid::new_v4(),
            current_player_id: Some(Uuid::new_v4()),
            current_bid,
            current_team_id: None,
            current_team_name: None,
            timer_started_at: None,
            timer_duration: 60,
            status: AuctionStatus::InProgress,
            bid_history: Json::Array(vec![]),
        }
    }

    fn on_block(state: &auction_states::Model) -> Uuid {
        state.current_player_id.unwrap()
    }

    #[test]
    fn test_accepts_valid_bid() {
        let state = active_state(Some(10_000));
        let result = validate_bid(
            15_000,
            on_block(&state),
            &team(200_000, 0),
            &[],
            &HashMap::new(),
            Some(&state),
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_obligation_shortfall_rejects_any_amount() {
        // remaining 50_000 against 60_000 of obligations: even a 1-unit bid
        // is rejected with the shortfall reason.
        let cats = vec![category(6, 10_000)];
        let state = active_state(Some(0));
        let result = validate_bid(
            1,
            on_block(&state),
            &team(100_000, 50_000),
            &cats,
            &HashMap::new(),
            Some(&state),
        );
        assert_eq!(
            result,
            Err(AuctionError::ObligationShortfall { shortfall: 10_000 })
        );
    }

    #[test]
    fn test_exceeds_effective_budget() {
        let cats = vec![category(3, 10_000)];
        let state = active_state(Some(0));
        let result = validate_bid(
            75_000,
            on_block(&state),
            &team(100_000, 0),
            &cats,
            &HashMap::new(),
            Some(&state),
        );
        assert_eq!(
            result,
            Err(AuctionError::ExceedsEffectiveBudget { max_bid: 70_000 })
        );
    }

    #[test]
    fn test_auction_not_active_when_state_missing() {
        let result = validate_bid(
            1_000,
            Uuid::new_v4(),
            &team(100_000, 0),
            &[],
            &HashMap::new(),
            None,
        );
        assert_eq!(result, Err(AuctionError::AuctionNotActive));
    }

    #[test]
    fn test_auction_not_active_when_paused() {
        let mut state = active_state(Some(0));
        state.status = AuctionStatus::Paused;
        let result = validate_bid(
            1_000,
            on_block(&state),
            &team(100_000, 0),
            &[],
            &HashMap::new(),
            Some(&state),
        );
        assert_eq!(result, Err(AuctionError::AuctionNotActive));
    }

    #[test]
    fn test_bid_rejected_when_no_player_on_block() {
        // An in-progress auction straight after start or finalize has no
        // current player and no current bid; nothing is biddable.
        let mut state = active_state(None);
        state.current_player_id = None;
        let result = validate_bid(
            1_000,
            Uuid::new_v4(),
            &team(100_000, 0),
            &[],
            &HashMap::new(),
            Some(&state),
        );
        assert_eq!(result, Err(AuctionError::PlayerNotOnBlock));
    }

    #[test]
    fn test_bid_for_other_player_rejected() {
        let state = active_state(Some(10_000));
        let result = validate_bid(
            15_000,
            Uuid::new_v4(),
            &team(200_000, 0),
            &[],
            &HashMap::new(),
            Some(&state),
        );
        assert_eq!(result, Err(AuctionError::PlayerNotOnBlock));
    }

    #[test]
    fn test_tie_bid_rejected() {
        // Strict inequality: matching the current bid is too low.
        let state = active_state(Some(15_000));
        let result = validate_bid(
            15_000,
            on_block(&state),
            &team(200_000, 0),
            &[],
            &HashMap::new(),
            Some(&state),
        );
        assert_eq!(result, Err(AuctionError::BidTooLow { current_bid: 15_000 }));
    }

    #[test]
    fn test_budget_checks_run_before_state_checks() {
        // Even with no auction state, a team over its obligations gets the
        // shortfall reason first.
        let cats = vec![category(6, 10_000)];
        let result = validate_bid(
            1,
            Uuid::new_v4(),
            &team(100_000, 50_000),
            &cats,
            &HashMap::new(),
            None,
        );
        assert!(matches!(
            result,
            Err(AuctionError::ObligationShortfall { .. })
        ));
    }

    #[test]
    fn test_owned_players_reduce_obligations() {
        let cat = category(6, 10_000);
        let cat_id = cat.id;
        let cats = vec![cat];
        let mut counts = HashMap::new();
        counts.insert(cat_id, 5);
        let state = active_state(Some(10_000));
        // 50_000 remaining, one player still owed at 10_000 base: a 35_000
        // bid fits within the 40_000 effective budget.
        let result = validate_bid(
            35_000,
            on_block(&state),
            &team(100_000, 50_000),
            &cats,
            &counts,
            Some(&state),
        );
        assert_eq!(result, Ok(()));
    }
}
