pub mod analytics;
pub mod auction_snapshot;
pub mod bid_request;
pub mod category_request;
pub mod event_request;
pub mod next_player_request;
pub mod player_request;
pub mod team_request;
