use serde::{Deserialize, Serialize};

/// Per-event auction rules. `min_bid_increment` is stored and surfaced but
/// not enforced when validating bids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRules {
    #[serde(default = "default_min_squad_size")]
    pub min_squad_size: i32,
    #[serde(default = "default_max_squad_size")]
    pub max_squad_size: i32,
    #[serde(default = "default_min_bid_increment")]
    pub min_bid_increment: i64,
    #[serde(default = "default_timer_duration")]
    pub timer_duration: i32,
}

fn default_min_squad_size() -> i32 {
    11
}

fn default_max_squad_size() -> i32 {
    18
}

fn default_min_bid_increment() -> i64 {
    50_000
}

fn default_timer_duration() -> i32 {
    60
}

impl Default for EventRules {
    fn default() -> Self {
        Self {
            min_squad_size: default_min_squad_size(),
            max_squad_size: default_max_squad_size(),
            min_bid_increment: default_min_bid_increment(),
            timer_duration: default_timer_duration(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub date: String,
    #[serde(default)]
    pub rules: EventRules,
    pub description: Option<String>,
}
