//! Auction error kinds.
//!
//! Every failure the core can report is a structured, user-displayable
//! reason. `TransactionConflict` is the only kind that handlers retry;
//! everything else is terminal for the request.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("team cannot cover base price obligations (shortfall: {shortfall})")]
    ObligationShortfall { shortfall: i64 },

    #[error("bid exceeds effective budget (maximum bid: {max_bid})")]
    ExceedsEffectiveBudget { max_bid: i64 },

    #[error("bid exceeds remaining budget ({remaining})")]
    InsufficientRawBudget { remaining: i64 },

    #[error("auction is not in progress")]
    AuctionNotActive,

    #[error("player is not on the block")]
    PlayerNotOnBlock,

    #[error("bid must be higher than current bid ({current_bid})")]
    BidTooLow { current_bid: i64 },

    #[error("invalid category configuration: {0}")]
    InvalidCategoryConfig(String),

    #[error("concurrent update detected")]
    TransactionConflict,

    #[error("database error: {0}")]
    Db(String),
}

impl AuctionError {
    /// Stable machine-readable tag included in error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            AuctionError::NotFound(_) => "not_found",
            AuctionError::ObligationShortfall { .. } => "obligation_shortfall",
            AuctionError::ExceedsEffectiveBudget { .. } => "exceeds_effective_budget",
            AuctionError::InsufficientRawBudget { .. } => "insufficient_raw_budget",
            AuctionError::AuctionNotActive => "auction_not_active",
            AuctionError::PlayerNotOnBlock => "player_not_on_block",
            AuctionError::BidTooLow { .. } => "bid_too_low",
            AuctionError::InvalidCategoryConfig(_) => "invalid_category_config",
            AuctionError::TransactionConflict => "transaction_conflict",
            AuctionError::Db(_) => "db_error",
        }
    }
}

impl From<sea_orm::DbErr> for AuctionError {
    fn from(err: sea_orm::DbErr) -> Self {
        let msg = err.to_string();
        let lowered = msg.to_lowercase();
        // Postgres serialization failures and deadlocks are retryable.
        if lowered.contains("could not serialize")
            || lowered.contains("deadlock")
            || lowered.contains("serialization failure")
        {
            AuctionError::TransactionConflict
        } else {
            AuctionError::Db(msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_are_distinct() {
        let errors = [
            AuctionError::NotFound("player"),
            AuctionError::ObligationShortfall { shortfall: 1 },
            AuctionError::ExceedsEffectiveBudget { max_bid: 1 },
            AuctionError::InsufficientRawBudget { remaining: 1 },
            AuctionError::AuctionNotActive,
            AuctionError::PlayerNotOnBlock,
            AuctionError::BidTooLow { current_bid: 1 },
            AuctionError::InvalidCategoryConfig("x".to_string()),
            AuctionError::TransactionConflict,
            AuctionError::Db("x".to_string()),
        ];
        let mut kinds: Vec<&str> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_serialization_failure_maps_to_conflict() {
        let err = sea_orm::DbErr::Custom(
            "ERROR: could not serialize access due to concurrent update".to_string(),
        );
        assert_eq!(AuctionError::from(err), AuctionError::TransactionConflict);
    }

    #[test]
    fn test_other_db_errors_pass_through() {
        let err = sea_orm::DbErr::Custom("connection refused".to_string());
        assert!(matches!(AuctionError::from(err), AuctionError::Db(_)));
    }
}
