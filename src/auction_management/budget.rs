//! Budget obligation calculator.
//!
//! Pure functions computing how much of a team's remaining budget is
//! reserved for filling each category's minimum headcount at base price,
//! and the resulting safe-bid ceiling. No side effects; everything here
//! depends only on in-memory domain types and std.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entity::categories;

/// Absolute floor of the safe-bid buffer, in currency units.
pub const SAFE_BID_BUFFER_FLOOR: i64 = 10_000;

/// Fraction of remaining obligations reserved as extra headroom.
pub const SAFE_BID_BUFFER_RATE: f64 = 0.10;

/// Per-category view of the outstanding minimum-headcount obligation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryObligation {
    pub category_id: Uuid,
    pub category_name: String,
    pub base_price: i64,
    pub min_players: i32,
    pub current_count: i32,
    pub remaining_needed: i32,
    pub obligation: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObligationReport {
    pub per_category: Vec<CategoryObligation>,
    pub total_obligation: i64,
    pub total_minimum_squad_size: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub total_budget: i64,
    pub spent: i64,
    pub remaining: i64,
    pub total_obligation: i64,
    pub effective_budget: i64,
    pub can_bid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeBid {
    pub max_safe_bid: i64,
    pub buffer_amount: i64,
    pub max_safe_bid_with_buffer: i64,
}

/// Compute the outstanding obligation for every category.
///
/// A category a team has already filled to its minimum contributes zero,
/// never a negative amount.
pub fn compute_obligations(
    categories: &[categories::Model],
    owned_counts: &HashMap<Uuid, i32>,
) -> ObligationReport {
    let mut per_category = Vec::with_capacity(categories.len());
    let mut total_obligation: i64 = 0;
    let mut total_minimum_squad_size: i32 = 0;

    for category in categories {
        let current_count = owned_counts.get(&category.id).copied().unwrap_or(0);
        let remaining_needed = (category.min_players - current_count).max(0);
        let obligation = i64::from(remaining_needed) * category.base_price;

        total_obligation += obligation;
        total_minimum_squad_size += category.min_players;

        per_category.push(CategoryObligation {
            category_id: category.id,
            category_name: category.name.clone(),
            base_price: category.base_price,
            min_players: category.min_players,
            current_count,
            remaining_needed,
            obligation,
        });
    }

    ObligationReport {
        per_category,
        total_obligation,
        total_minimum_squad_size,
    }
}

/// Compute the budget actually available for discretionary bidding.
///
/// `can_bid` uses the unclamped difference, so a team exactly at its
/// obligation ceiling cannot bid at all.
pub fn compute_effective_budget(budget: i64, spent: i64, total_obligation: i64) -> BudgetSummary {
    let remaining = budget - spent;
    let effective_budget = (remaining - total_obligation).max(0);

    BudgetSummary {
        total_budget: budget,
        spent,
        remaining,
        total_obligation,
        effective_budget,
        can_bid: remaining - total_obligation > 0,
    }
}

/// Compute the safe-bid ceiling for a team.
///
/// When the player on the block belongs to a category still short of its
/// minimum, one base-price unit of that category's obligation is released:
/// winning this bid counts toward the requirement, so it must not be
/// double-reserved against.
pub fn max_safe_bid(
    remaining_budget: i64,
    total_obligation: i64,
    bidding_category: Option<&CategoryObligation>,
) -> SafeBid {
    let credit = match bidding_category {
        Some(cat) if cat.remaining_needed > 0 => cat.base_price,
        _ => 0,
    };
    let adjusted_obligation = total_obligation - credit;

    let max_safe_bid = (remaining_budget - adjusted_obligation).max(0);
    let buffer_amount =
        SAFE_BID_BUFFER_FLOOR.max((adjusted_obligation as f64 * SAFE_BID_BUFFER_RATE).round() as i64);
    let max_safe_bid_with_buffer = (max_safe_bid - buffer_amount).max(0);

    SafeBid {
        max_safe_bid,
        buffer_amount,
        max_safe_bid_with_buffer,
    }
}

/// Check category invariants (`min_players <= max_players`, non-negative
/// headcounts and base price).
pub fn validate_category_config(
    min_players: i32,
    max_players: i32,
    base_price: i64,
) -> Result<(), String> {
    if min_players < 0 {
        return Err(format!("min_players must be non-negative, got {min_players}"));
    }
    if min_players > max_players {
        return Err(format!(
            "min_players ({min_players}) must not exceed max_players ({max_players})"
        ));
    }
    if base_price < 0 {
        return Err(format!("base_price must be non-negative, got {base_price}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: Uuid, name: &str, min_players: i32, base_price: i64) -> categories::Model {
        categories::Model {
            id,
            event_id: Uuid::new_v4(),
            name: name.to_string(),
            min_players,
            max_players: min_players + 5,
            base_price,
            color: "#ffffff".to_string(),
        }
    }

    #[test]
    fn test_obligation_never_negative() {
        let id = Uuid::new_v4();
        let cats = vec![category(id, "A", 2, 10_000)];

        // Owning more players than the minimum contributes zero.
        let mut counts = HashMap::new();
        counts.insert(id, 5);
        let report = compute_obligations(&cats, &counts);
        assert_eq!(report.per_category[0].remaining_needed, 0);
        assert_eq!(report.per_category[0].obligation, 0);
        assert_eq!(report.total_obligation, 0);
    }

    #[test]
    fn test_zero_categories() {
        let report = compute_obligations(&[], &HashMap::new());
        assert_eq!(report.total_obligation, 0);
        assert!(report.per_category.is_empty());

        // Safe bid equals remaining budget minus the buffer floor.
        let safe = max_safe_bid(80_000, report.total_obligation, None);
        assert_eq!(safe.max_safe_bid, 80_000);
        assert_eq!(safe.buffer_amount, SAFE_BID_BUFFER_FLOOR);
        assert_eq!(safe.max_safe_bid_with_buffer, 70_000);
    }

    #[test]
    fn test_obligation_and_safe_bid_scenario() {
        // Four categories, team owns one player in each of the first three,
        // budget 200_000 with 120_000 spent.
        let (c1, c2, c3, c4) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let cats = vec![
            category(c1, "A+", 1, 20_000),
            category(c2, "A", 4, 10_000),
            category(c3, "B", 4, 5_000),
            category(c4, "C", 3, 3_000),
        ];
        let mut counts = HashMap::new();
        counts.insert(c1, 1);
        counts.insert(c2, 1);
        counts.insert(c3, 1);

        let report = compute_obligations(&cats, &counts);
        assert_eq!(report.per_category[0].obligation, 0);
        assert_eq!(report.per_category[1].obligation, 30_000);
        assert_eq!(report.per_category[2].obligation, 15_000);
        assert_eq!(report.per_category[3].obligation, 9_000);
        assert_eq!(report.total_obligation, 54_000);

        let summary = compute_effective_budget(200_000, 120_000, report.total_obligation);
        assert_eq!(summary.remaining, 80_000);
        assert_eq!(summary.effective_budget, 26_000);
        assert!(summary.can_bid);

        let safe = max_safe_bid(summary.remaining, report.total_obligation, None);
        assert_eq!(safe.max_safe_bid, 26_000);
        assert_eq!(safe.buffer_amount, 10_000); // max(10_000, 5_400)
        assert_eq!(safe.max_safe_bid_with_buffer, 16_000);
    }

    #[test]
    fn test_bidding_category_releases_one_unit() {
        let (c1, c2) = (Uuid::new_v4(), Uuid::new_v4());
        let cats = vec![category(c1, "A", 2, 10_000), category(c2, "B", 1, 5_000)];
        let report = compute_obligations(&cats, &HashMap::new());
        assert_eq!(report.total_obligation, 25_000);

        // Bidding on a player in category A releases one 10_000 unit.
        let safe = max_safe_bid(30_000, report.total_obligation, Some(&report.per_category[0]));
        assert_eq!(safe.max_safe_bid, 15_000);

        // A filled category releases nothing.
        let mut counts = HashMap::new();
        counts.insert(c1, 2);
        let report = compute_obligations(&cats, &counts);
        let safe = max_safe_bid(30_000, report.total_obligation, Some(&report.per_category[0]));
        assert_eq!(safe.max_safe_bid, 25_000);
    }

    #[test]
    fn test_effective_budget_bounds() {
        // effective_budget <= remaining and >= 0 for any inputs.
        for (budget, spent, obligation) in [
            (100_000_i64, 0_i64, 0_i64),
            (100_000, 50_000, 75_000),
            (100_000, 100_000, 10_000),
            (50_000, 80_000, 0),
        ] {
            let summary = compute_effective_budget(budget, spent, obligation);
            assert!(summary.effective_budget >= 0);
            assert!(summary.effective_budget <= summary.remaining.max(0));
        }
    }

    #[test]
    fn test_at_obligation_ceiling_cannot_bid() {
        let summary = compute_effective_budget(100_000, 50_000, 50_000);
        assert_eq!(summary.remaining, 50_000);
        assert_eq!(summary.effective_budget, 0);
        assert!(!summary.can_bid);
    }

    #[test]
    fn test_safe_bid_ordering() {
        // max_safe_bid_with_buffer <= max_safe_bid <= remaining budget.
        for (remaining, obligation) in [(0_i64, 0_i64), (80_000, 54_000), (5_000, 100_000), (200_000, 0)]
        {
            let safe = max_safe_bid(remaining, obligation, None);
            assert!(safe.max_safe_bid_with_buffer <= safe.max_safe_bid);
            assert!(safe.max_safe_bid <= remaining.max(0));
        }
    }

    #[test]
    fn test_buffer_uses_percentage_when_larger() {
        let safe = max_safe_bid(1_000_000, 200_000, None);
        assert_eq!(safe.buffer_amount, 20_000);
    }

    #[test]
    fn test_validate_category_config() {
        assert!(validate_category_config(1, 4, 10_000).is_ok());
        assert!(validate_category_config(0, 0, 0).is_ok());
        assert!(validate_category_config(-1, 4, 10_000).is_err());
        assert!(validate_category_config(5, 4, 10_000).is_err());
        assert!(validate_category_config(1, 4, -1).is_err());
    }
}
