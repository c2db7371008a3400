use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeamRequest {
    pub event_id: Uuid,
    pub name: String,
    pub budget: i64,
    pub max_squad_size: i32,
    pub color: Option<String>,
}
