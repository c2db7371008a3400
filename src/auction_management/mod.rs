//! Auction management module
//!
//! This module contains the core auction logic: event, category, team and
//! player persistence, the live auction state machine, bid admission and
//! sale settlement. Every multi-entity mutation runs inside a single
//! database transaction with row locks; `TransactionConflict` failures are
//! retried with full re-validation.

pub mod budget;
pub mod error;
pub mod state;
pub mod validation;

use actix_web::{get, post, web, HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, FixedOffset, Utc};

use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionError, TransactionTrait,
};
use sea_orm::prelude::Json;
use serde_json::json;
use uuid::Uuid;

use crate::auction_management::budget::{
    compute_effective_budget, compute_obligations, max_safe_bid, validate_category_config,
};
use crate::auction_management::error::AuctionError;
use crate::auction_management::state::{
    demote_current_players, owned_player_counts, push_history, reconcile_team_caches,
    release_ledger, sale_ledger, snapshot_from,
};
use crate::auction_management::validation::validate_bid;
use crate::dto::analytics::{AuctionAnalytics, TeamAnalytics};
use crate::dto::auction_snapshot::BidHistoryEntry;
use crate::dto::bid_request::BidRequest;
use crate::dto::category_request::CreateCategoryRequest;
use crate::dto::event_request::CreateEventRequest;
use crate::dto::next_player_request::NextPlayerRequest;
use crate::dto::player_request::CreatePlayerRequest;
use crate::dto::team_request::CreateTeamRequest;
use crate::entity::events::AuctionStatus;
use crate::entity::players::PlayerStatus;
use crate::entity::users::UserRole;
use crate::entity::{auction_states, bids, categories, events, players, teams};
use crate::jwt::get_user;

/// Maximum attempts for a transaction rejected by a concurrency conflict.
const MAX_TXN_ATTEMPTS: usize = 3;

/// Outcome of finalizing the player currently on the block.
enum SaleOutcome {
    Sold {
        player_id: Uuid,
        team_id: Uuid,
        price: i64,
    },
    Unsold {
        player_id: Uuid,
    },
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized()
        .content_type("application/json")
        .json(json!({ "error": "User not authenticated" }))
}

fn forbidden(message: &str) -> HttpResponse {
    HttpResponse::Forbidden()
        .content_type("application/json")
        .json(json!({ "error": message }))
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest()
        .content_type("application/json")
        .json(json!({ "error": message }))
}

/// Map an auction error to its HTTP response, carrying the structured
/// reason in the body.
fn error_response(err: &AuctionError) -> HttpResponse {
    let body = json!({ "error": err.to_string(), "kind": err.kind() });
    match err {
        AuctionError::NotFound(_) => HttpResponse::NotFound()
            .content_type("application/json")
            .json(body),
        AuctionError::TransactionConflict => HttpResponse::Conflict()
            .content_type("application/json")
            .json(body),
        AuctionError::Db(_) => HttpResponse::InternalServerError()
            .content_type("application/json")
            .json(body),
        _ => HttpResponse::BadRequest()
            .content_type("application/json")
            .json(body),
    }
}

/// Run a transactional operation, retrying only on `TransactionConflict`.
/// Each retry re-runs the whole transaction, so validation always sees a
/// fresh consistent read.
async fn with_txn_retry<T, F, Fut>(mut run: F) -> Result<T, AuctionError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, TransactionError<AuctionError>>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match run().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let err = match err {
                    TransactionError::Connection(e) => AuctionError::from(e),
                    TransactionError::Transaction(e) => e,
                };
                if err == AuctionError::TransactionConflict && attempts < MAX_TXN_ATTEMPTS {
                    tracing::debug!(attempts, "retrying conflicting transaction");
                    continue;
                }
                return Err(err);
            }
        }
    }
}

// ============= EVENT ROUTES =============

#[post("/events")]
pub async fn create_event(
    req: HttpRequest,
    event_data: web::Json<CreateEventRequest>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let user = match get_user(&req) {
        Some(user) => user,
        None => return Ok(unauthorized()),
    };

    if user.role != UserRole::Organizer {
        return Ok(forbidden("Organizer access required"));
    }

    let now: DateTime<FixedOffset> = Utc::now().into();
    let event = events::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(event_data.name.clone()),
        date: Set(event_data.date.clone()),
        status: Set(AuctionStatus::NotStarted),
        description: Set(event_data.description.clone()),
        min_squad_size: Set(event_data.rules.min_squad_size),
        max_squad_size: Set(event_data.rules.max_squad_size),
        min_bid_increment: Set(event_data.rules.min_bid_increment),
        timer_duration: Set(event_data.rules.timer_duration),
        created_at: Set(now),
        created_by: Set(user.id),
    };

    match event.insert(&**db).await {
        Ok(event) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(event)),
        Err(e) => Ok(error_response(&AuctionError::from(e))),
    }
}

#[get("/events")]
pub async fn get_events(db: web::Data<DatabaseConnection>) -> ActixResult<HttpResponse> {
    match events::Entity::find()
        .order_by_desc(events::Column::CreatedAt)
        .all(&**db)
        .await
    {
        Ok(events) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(events)),
        Err(e) => Ok(error_response(&AuctionError::from(e))),
    }
}

#[get("/events/{event_id}")]
pub async fn get_event(
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let event_id = path.into_inner();

    match events::Entity::find_by_id(event_id).one(&**db).await {
        Ok(Some(event)) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(event)),
        Ok(None) => Ok(error_response(&AuctionError::NotFound("event"))),
        Err(e) => Ok(error_response(&AuctionError::from(e))),
    }
}

// ============= CATEGORY ROUTES =============

#[post("/categories")]
pub async fn create_category(
    req: HttpRequest,
    category_data: web::Json<CreateCategoryRequest>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let user = match get_user(&req) {
        Some(user) => user,
        None => return Ok(unauthorized()),
    };

    if user.role != UserRole::Organizer {
        return Ok(forbidden("Organizer access required"));
    }

    if let Err(reason) = validate_category_config(
        category_data.min_players,
        category_data.max_players,
        category_data.base_price,
    ) {
        return Ok(error_response(&AuctionError::InvalidCategoryConfig(reason)));
    }

    let event = match events::Entity::find_by_id(category_data.event_id)
        .one(&**db)
        .await
    {
        Ok(Some(event)) => event,
        Ok(None) => return Ok(error_response(&AuctionError::NotFound("event"))),
        Err(e) => return Ok(error_response(&AuctionError::from(e))),
    };

    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        event_id: Set(event.id),
        name: Set(category_data.name.clone()),
        min_players: Set(category_data.min_players),
        max_players: Set(category_data.max_players),
        base_price: Set(category_data.base_price),
        color: Set(category_data.color.clone()),
    };

    match category.insert(&**db).await {
        Ok(category) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(category)),
        Err(e) => Ok(error_response(&AuctionError::from(e))),
    }
}

#[get("/categories/event/{event_id}")]
pub async fn get_event_categories(
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let event_id = path.into_inner();

    match categories::Entity::find()
        .filter(categories::Column::EventId.eq(event_id))
        .all(&**db)
        .await
    {
        Ok(categories) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(categories)),
        Err(e) => Ok(error_response(&AuctionError::from(e))),
    }
}

// ============= TEAM ROUTES =============

#[post("/teams")]
pub async fn create_team(
    req: HttpRequest,
    team_data: web::Json<CreateTeamRequest>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let user = match get_user(&req) {
        Some(user) => user,
        None => return Ok(unauthorized()),
    };

    if user.role != UserRole::Organizer {
        return Ok(forbidden("Organizer access required"));
    }

    if team_data.budget < 0 {
        return Ok(bad_request("Team budget must be non-negative"));
    }

    let event = match events::Entity::find_by_id(team_data.event_id)
        .one(&**db)
        .await
    {
        Ok(Some(event)) => event,
        Ok(None) => return Ok(error_response(&AuctionError::NotFound("event"))),
        Err(e) => return Ok(error_response(&AuctionError::from(e))),
    };

    let team = teams::ActiveModel {
        id: Set(Uuid::new_v4()),
        event_id: Set(event.id),
        name: Set(team_data.name.clone()),
        budget: Set(team_data.budget),
        spent: Set(0),
        remaining: Set(team_data.budget),
        max_squad_size: Set(team_data.max_squad_size),
        players_count: Set(0),
        color: Set(team_data.color.clone()),
    };

    match team.insert(&**db).await {
        Ok(team) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(team)),
        Err(e) => Ok(error_response(&AuctionError::from(e))),
    }
}

#[get("/teams/event/{event_id}")]
pub async fn get_event_teams(
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let event_id = path.into_inner();

    match teams::Entity::find()
        .filter(teams::Column::EventId.eq(event_id))
        .all(&**db)
        .await
    {
        Ok(teams) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(teams)),
        Err(e) => Ok(error_response(&AuctionError::from(e))),
    }
}

#[get("/teams/{team_id}")]
pub async fn get_team(
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let team_id = path.into_inner();

    let team = match teams::Entity::find_by_id(team_id).one(&**db).await {
        Ok(Some(team)) => team,
        Ok(None) => return Ok(error_response(&AuctionError::NotFound("team"))),
        Err(e) => return Ok(error_response(&AuctionError::from(e))),
    };

    // Cached ledger fields may have drifted; reads repair rather than fail.
    match reconcile_team_caches(team, &**db).await {
        Ok(team) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(team)),
        Err(e) => Ok(error_response(&e)),
    }
}

#[get("/teams/{team_id}/budget")]
pub async fn get_team_budget(
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let team_id = path.into_inner();

    let team = match teams::Entity::find_by_id(team_id).one(&**db).await {
        Ok(Some(team)) => team,
        Ok(None) => return Ok(error_response(&AuctionError::NotFound("team"))),
        Err(e) => return Ok(error_response(&AuctionError::from(e))),
    };

    let team = match reconcile_team_caches(team, &**db).await {
        Ok(team) => team,
        Err(e) => return Ok(error_response(&e)),
    };

    let event_categories = match categories::Entity::find()
        .filter(categories::Column::EventId.eq(team.event_id))
        .all(&**db)
        .await
    {
        Ok(categories) => categories,
        Err(e) => return Ok(error_response(&AuctionError::from(e))),
    };

    let counts = match owned_player_counts(team.id, &**db).await {
        Ok(counts) => counts,
        Err(e) => return Ok(error_response(&e)),
    };

    let obligations = compute_obligations(&event_categories, &counts);
    let summary = compute_effective_budget(team.budget, team.spent, obligations.total_obligation);

    // When a player is on the block, their category's obligation is relaxed
    // by one unit for the safe-bid ceiling.
    let mut bidding_category = None;
    if let Ok(Some(auction_state)) = auction_states::Entity::find_by_id(team.event_id)
        .one(&**db)
        .await
    {
        if let Some(player_id) = auction_state.current_player_id {
            if let Ok(Some(player)) = players::Entity::find_by_id(player_id).one(&**db).await {
                bidding_category = obligations
                    .per_category
                    .iter()
                    .find(|c| c.category_id == player.category_id)
                    .cloned();
            }
        }
    }

    let safe_bid = max_safe_bid(
        summary.remaining,
        obligations.total_obligation,
        bidding_category.as_ref(),
    );

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .json(json!({
            "team_id": team.id,
            "team_name": team.name,
            "budget": summary,
            "obligations": obligations,
            "safe_bid": safe_bid
        })))
}

// ============= PLAYER ROUTES =============

#[post("/players")]
pub async fn create_player(
    req: HttpRequest,
    player_data: web::Json<CreatePlayerRequest>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let user = match get_user(&req) {
        Some(user) => user,
        None => return Ok(unauthorized()),
    };

    if user.role != UserRole::Organizer {
        return Ok(forbidden("Organizer access required"));
    }

    if player_data.base_price < 0 {
        return Ok(bad_request("Player base price must be non-negative"));
    }

    let category = match categories::Entity::find_by_id(player_data.category_id)
        .one(&**db)
        .await
    {
        Ok(Some(category)) => category,
        Ok(None) => return Ok(error_response(&AuctionError::NotFound("category"))),
        Err(e) => return Ok(error_response(&AuctionError::from(e))),
    };

    let player = players::ActiveModel {
        id: Set(Uuid::new_v4()),
        event_id: Set(category.event_id),
        category_id: Set(category.id),
        name: Set(player_data.name.clone()),
        base_price: Set(player_data.base_price),
        status: Set(PlayerStatus::Available),
        sold_to_team_id: Set(None),
        sold_price: Set(None),
    };

    match player.insert(&**db).await {
        Ok(player) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(player)),
        Err(e) => Ok(error_response(&AuctionError::from(e))),
    }
}

#[get("/players/category/{category_id}")]
pub async fn get_category_players(
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let category_id = path.into_inner();

    match players::Entity::find()
        .filter(players::Column::CategoryId.eq(category_id))
        .all(&**db)
        .await
    {
        Ok(players) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(players)),
        Err(e) => Ok(error_response(&AuctionError::from(e))),
    }
}

#[get("/players/{player_id}")]
pub async fn get_player(
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let player_id = path.into_inner();

    match players::Entity::find_by_id(player_id).one(&**db).await {
        Ok(Some(player)) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(player)),
        Ok(None) => Ok(error_response(&AuctionError::NotFound("player"))),
        Err(e) => Ok(error_response(&AuctionError::from(e))),
    }
}

/// Helper function to release a sold player within a transaction
async fn release_player_txn(
    player_id: Uuid,
    txn: &DatabaseTransaction,
) -> Result<(), AuctionError> {
    let player = players::Entity::find_by_id(player_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("player"))?;

    if player.status == PlayerStatus::Sold {
        if let Some(team_id) = player.sold_to_team_id {
            let team = teams::Entity::find_by_id(team_id)
                .lock(LockType::Update)
                .one(txn)
                .await?;

            match team {
                Some(team) => {
                    let refund = player.sold_price.unwrap_or(0);
                    let (spent, remaining, players_count) =
                        release_ledger(team.budget, team.spent, team.players_count, refund);

                    let mut team_model: teams::ActiveModel = team.into();
                    team_model.spent = Set(spent);
                    team_model.remaining = Set(remaining);
                    team_model.players_count = Set(players_count);
                    team_model.update(txn).await?;
                }
                None => {
                    // The owning team vanished; still free the player.
                    tracing::warn!(%player_id, %team_id, "releasing player owned by missing team");
                }
            }
        }
    }

    let mut player_model: players::ActiveModel = player.into();
    player_model.status = Set(PlayerStatus::Available);
    player_model.sold_to_team_id = Set(None);
    player_model.sold_price = Set(None);
    player_model.update(txn).await?;

    Ok(())
}

#[post("/players/{player_id}/release")]
pub async fn release_player(
    req: HttpRequest,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let user = match get_user(&req) {
        Some(user) => user,
        None => return Ok(unauthorized()),
    };

    if user.role != UserRole::Organizer {
        return Ok(forbidden("Organizer access required"));
    }

    let player_id = path.into_inner();

    let result = with_txn_retry(|| {
        db.transaction(|txn| Box::pin(release_player_txn(player_id, txn)))
    })
    .await;

    match result {
        Ok(()) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(json!({ "message": "Player released", "player_id": player_id }))),
        Err(e) => Ok(error_response(&e)),
    }
}

// ============= AUCTION CONTROL ROUTES =============

/// Helper function to start (or restart) an auction within a transaction
async fn start_auction_txn(event_id: Uuid, txn: &DatabaseTransaction) -> Result<(), AuctionError> {
    let event = events::Entity::find_by_id(event_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("event"))?;

    let timer_duration = event.timer_duration;
    let mut event_model: events::ActiveModel = event.into();
    event_model.status = Set(AuctionStatus::InProgress);
    event_model.update(txn).await?;

    // Restarting wipes any in-flight bidding; that is the explicit contract
    // of this organizer action.
    let existing = auction_states::Entity::find_by_id(event_id)
        .lock(LockType::Update)
        .one(txn)
        .await?;

    match existing {
        Some(auction_state) => {
            let mut model: auction_states::ActiveModel = auction_state.into();
            model.current_player_id = Set(None);
            model.current_bid = Set(None);
            model.current_team_id = Set(None);
            model.current_team_name = Set(None);
            model.timer_started_at = Set(None);
            model.timer_duration = Set(timer_duration);
            model.status = Set(AuctionStatus::InProgress);
            model.bid_history = Set(Json::Array(vec![]));
            model.update(txn).await?;
        }
        None => {
            let model = auction_states::ActiveModel {
                event_id: Set(event_id),
                current_player_id: Set(None),
                current_bid: Set(None),
                current_team_id: Set(None),
                current_team_name: Set(None),
                timer_started_at: Set(None),
                timer_duration: Set(timer_duration),
                status: Set(AuctionStatus::InProgress),
                bid_history: Set(Json::Array(vec![])),
            };
            model.insert(txn).await?;
        }
    }

    Ok(())
}

#[post("/auction/start/{event_id}")]
pub async fn start_auction(
    req: HttpRequest,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let user = match get_user(&req) {
        Some(user) => user,
        None => return Ok(unauthorized()),
    };

    if user.role != UserRole::Organizer {
        return Ok(forbidden("Organizer access required"));
    }

    let event_id = path.into_inner();

    let result =
        with_txn_retry(|| db.transaction(|txn| Box::pin(start_auction_txn(event_id, txn)))).await;

    match result {
        Ok(()) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(json!({ "message": "Auction started successfully" }))),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Helper function to set the auction status on event and state together
async fn set_auction_status_txn(
    event_id: Uuid,
    status: AuctionStatus,
    txn: &DatabaseTransaction,
) -> Result<(), AuctionError> {
    let event = events::Entity::find_by_id(event_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("event"))?;

    let auction_state = auction_states::Entity::find_by_id(event_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("auction state"))?;

    let mut event_model: events::ActiveModel = event.into();
    event_model.status = Set(status);
    event_model.update(txn).await?;

    // Current player and bid are kept; a paused auction is resumable.
    let mut state_model: auction_states::ActiveModel = auction_state.into();
    state_model.status = Set(status);
    state_model.update(txn).await?;

    Ok(())
}

#[post("/auction/pause/{event_id}")]
pub async fn pause_auction(
    req: HttpRequest,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let user = match get_user(&req) {
        Some(user) => user,
        None => return Ok(unauthorized()),
    };

    if user.role != UserRole::Organizer {
        return Ok(forbidden("Organizer access required"));
    }

    let event_id = path.into_inner();

    let result = with_txn_retry(|| {
        db.transaction(|txn| {
            Box::pin(set_auction_status_txn(event_id, AuctionStatus::Paused, txn))
        })
    })
    .await;

    match result {
        Ok(()) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(json!({ "message": "Auction paused" }))),
        Err(e) => Ok(error_response(&e)),
    }
}

#[post("/auction/resume/{event_id}")]
pub async fn resume_auction(
    req: HttpRequest,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let user = match get_user(&req) {
        Some(user) => user,
        None => return Ok(unauthorized()),
    };

    if user.role != UserRole::Organizer {
        return Ok(forbidden("Organizer access required"));
    }

    let event_id = path.into_inner();

    let result = with_txn_retry(|| {
        db.transaction(|txn| {
            Box::pin(set_auction_status_txn(
                event_id,
                AuctionStatus::InProgress,
                txn,
            ))
        })
    })
    .await;

    match result {
        Ok(()) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(json!({ "message": "Auction resumed" }))),
        Err(e) => Ok(error_response(&e)),
    }
}

#[post("/auction/complete/{event_id}")]
pub async fn complete_auction(
    req: HttpRequest,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let user = match get_user(&req) {
        Some(user) => user,
        None => return Ok(unauthorized()),
    };

    if user.role != UserRole::Organizer {
        return Ok(forbidden("Organizer access required"));
    }

    let event_id = path.into_inner();

    let result = with_txn_retry(|| {
        db.transaction(|txn| {
            Box::pin(set_auction_status_txn(
                event_id,
                AuctionStatus::Completed,
                txn,
            ))
        })
    })
    .await;

    match result {
        Ok(()) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(json!({ "message": "Auction completed" }))),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Helper function to put the next player on the block within a transaction
///
/// Demoting any stale CURRENT player and promoting the new one happen in
/// the same atomic unit, so the event never observes zero or two CURRENT
/// players.
async fn set_next_player_txn(
    event_id: Uuid,
    player_id: Uuid,
    txn: &DatabaseTransaction,
) -> Result<players::Model, AuctionError> {
    let auction_state = auction_states::Entity::find_by_id(event_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("auction state"))?;

    let player = players::Entity::find_by_id(player_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .filter(|p| p.event_id == event_id)
        .ok_or(AuctionError::NotFound("player"))?;

    demote_current_players(event_id, player.id, txn).await?;

    let base_price = player.base_price;
    let mut player_model: players::ActiveModel = player.into();
    player_model.status = Set(PlayerStatus::Current);
    let player = player_model.update(txn).await?;

    let now: DateTime<FixedOffset> = Utc::now().into();
    let mut state_model: auction_states::ActiveModel = auction_state.into();
    state_model.current_player_id = Set(Some(player_id));
    state_model.current_bid = Set(Some(base_price));
    state_model.current_team_id = Set(None);
    state_model.current_team_name = Set(None);
    state_model.timer_started_at = Set(Some(now));
    state_model.bid_history = Set(Json::Array(vec![]));
    state_model.update(txn).await?;

    Ok(player)
}

#[post("/auction/next-player/{event_id}")]
pub async fn next_player(
    req: HttpRequest,
    path: web::Path<Uuid>,
    player_data: web::Json<NextPlayerRequest>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let user = match get_user(&req) {
        Some(user) => user,
        None => return Ok(unauthorized()),
    };

    if user.role != UserRole::Organizer {
        return Ok(forbidden("Organizer access required"));
    }

    let event_id = path.into_inner();
    let player_id = player_data.player_id;

    let result = with_txn_retry(|| {
        db.transaction(|txn| Box::pin(set_next_player_txn(event_id, player_id, txn)))
    })
    .await;

    match result {
        Ok(player) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(json!({ "message": "Next player set", "player": player }))),
        Err(e) => Ok(error_response(&e)),
    }
}

#[get("/auction/state/{event_id}")]
pub async fn get_auction_state(
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let event_id = path.into_inner();

    match auction_states::Entity::find_by_id(event_id).one(&**db).await {
        Ok(auction_state) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(snapshot_from(event_id, auction_state.as_ref()))),
        Err(e) => Ok(error_response(&AuctionError::from(e))),
    }
}

// ============= BIDDING ROUTES =============

/// Helper function to place a bid within a transaction
///
/// The auction state and team rows are locked, then the bid is validated
/// against the freshly read `current_bid`. Two racing bids serialize on the
/// state row; the loser re-validates against the winner's amount.
async fn place_bid_txn(
    event_id: Uuid,
    player_id: Uuid,
    team_id: Uuid,
    amount: i64,
    txn: &DatabaseTransaction,
) -> Result<bids::Model, AuctionError> {
    let auction_state = auction_states::Entity::find_by_id(event_id)
        .lock(LockType::Update)
        .one(txn)
        .await?;

    let team = teams::Entity::find_by_id(team_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("team"))?;

    let event_categories = categories::Entity::find()
        .filter(categories::Column::EventId.eq(team.event_id))
        .all(txn)
        .await?;

    let counts = owned_player_counts(team.id, txn).await?;

    validate_bid(
        amount,
        player_id,
        &team,
        &event_categories,
        &counts,
        auction_state.as_ref(),
    )?;

    // validate_bid rejects when the state is missing or inactive.
    let auction_state = auction_state.ok_or(AuctionError::AuctionNotActive)?;

    let now: DateTime<FixedOffset> = Utc::now().into();
    let bid = bids::ActiveModel {
        id: Set(Uuid::new_v4()),
        player_id: Set(player_id),
        event_id: Set(event_id),
        team_id: Set(team.id),
        team_name: Set(team.name.clone()),
        amount: Set(amount),
        created_at: Set(now),
    };
    let bid = bid.insert(txn).await?;

    let entry = BidHistoryEntry {
        bid_id: bid.id,
        player_id,
        team_id: team.id,
        team_name: team.name.clone(),
        amount,
        timestamp: now,
    };
    let history = push_history(&auction_state.bid_history, entry);

    let mut state_model: auction_states::ActiveModel = auction_state.into();
    state_model.current_bid = Set(Some(amount));
    state_model.current_team_id = Set(Some(team.id));
    state_model.current_team_name = Set(Some(team.name));
    state_model.timer_started_at = Set(Some(now));
    state_model.bid_history = Set(history);
    state_model.update(txn).await?;

    Ok(bid)
}

#[post("/bids/place")]
pub async fn place_bid(
    req: HttpRequest,
    bid_data: web::Json<BidRequest>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let user = match get_user(&req) {
        Some(user) => user,
        None => return Ok(unauthorized()),
    };

    if user.role != UserRole::TeamAdmin && user.role != UserRole::Organizer {
        return Ok(forbidden("Team admin access required"));
    }

    let team_id = match user.team_id {
        Some(team_id) => team_id,
        None => return Ok(bad_request("User not associated with a team")),
    };

    if bid_data.amount <= 0 {
        return Ok(bad_request("Bid amount must be positive"));
    }

    let event_id = bid_data.event_id;
    let player_id = bid_data.player_id;
    let amount = bid_data.amount;

    let result = with_txn_retry(|| {
        db.transaction(|txn| Box::pin(place_bid_txn(event_id, player_id, team_id, amount, txn)))
    })
    .await;

    match result {
        Ok(bid) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(bid)),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Helper function to finalize the sale of the current player within a
/// transaction
///
/// Player status, team ledger and auction-state reset all commit together
/// or not at all. With no leading bidder the player is marked UNSOLD and no
/// team is touched; that is a terminal branch, not an error.
async fn finalize_sale_txn(
    event_id: Uuid,
    txn: &DatabaseTransaction,
) -> Result<SaleOutcome, AuctionError> {
    let auction_state = auction_states::Entity::find_by_id(event_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("auction state"))?;

    let player_id = auction_state
        .current_player_id
        .ok_or(AuctionError::NotFound("current player"))?;

    let player = players::Entity::find_by_id(player_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("player"))?;

    let outcome = match auction_state.current_team_id {
        None => {
            let mut player_model: players::ActiveModel = player.into();
            player_model.status = Set(PlayerStatus::Unsold);
            player_model.update(txn).await?;
            SaleOutcome::Unsold { player_id }
        }
        Some(team_id) => {
            let price = auction_state.current_bid.unwrap_or(player.base_price);

            let team = teams::Entity::find_by_id(team_id)
                .lock(LockType::Update)
                .one(txn)
                .await?
                .ok_or(AuctionError::NotFound("team"))?;

            let (spent, remaining, players_count) =
                sale_ledger(team.budget, team.spent, team.players_count, price);
            if remaining < 0 {
                return Err(AuctionError::InsufficientRawBudget {
                    remaining: team.remaining,
                });
            }

            let mut player_model: players::ActiveModel = player.into();
            player_model.status = Set(PlayerStatus::Sold);
            player_model.sold_to_team_id = Set(Some(team_id));
            player_model.sold_price = Set(Some(price));
            player_model.update(txn).await?;

            let mut team_model: teams::ActiveModel = team.into();
            team_model.spent = Set(spent);
            team_model.remaining = Set(remaining);
            team_model.players_count = Set(players_count);
            team_model.update(txn).await?;

            SaleOutcome::Sold {
                player_id,
                team_id,
                price,
            }
        }
    };

    // The auction continues to the next player; only the per-player fields
    // are cleared.
    let mut state_model: auction_states::ActiveModel = auction_state.into();
    state_model.current_player_id = Set(None);
    state_model.current_bid = Set(None);
    state_model.current_team_id = Set(None);
    state_model.current_team_name = Set(None);
    state_model.timer_started_at = Set(None);
    state_model.bid_history = Set(Json::Array(vec![]));
    state_model.update(txn).await?;

    Ok(outcome)
}

#[post("/bids/finalize/{event_id}")]
pub async fn finalize_sale(
    req: HttpRequest,
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let user = match get_user(&req) {
        Some(user) => user,
        None => return Ok(unauthorized()),
    };

    if user.role != UserRole::Organizer {
        return Ok(forbidden("Organizer access required"));
    }

    let event_id = path.into_inner();

    let result =
        with_txn_retry(|| db.transaction(|txn| Box::pin(finalize_sale_txn(event_id, txn)))).await;

    match result {
        Ok(SaleOutcome::Sold {
            player_id,
            team_id,
            price,
        }) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(json!({
                "message": "Sale finalized",
                "outcome": "sold",
                "player_id": player_id,
                "team_id": team_id,
                "price": price
            }))),
        Ok(SaleOutcome::Unsold { player_id }) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(json!({
                "message": "Player marked as unsold",
                "outcome": "unsold",
                "player_id": player_id
            }))),
        Err(e) => Ok(error_response(&e)),
    }
}

// ============= ANALYTICS ROUTES =============

#[get("/analytics/event/{event_id}")]
pub async fn get_event_analytics(
    path: web::Path<Uuid>,
    db: web::Data<DatabaseConnection>,
) -> ActixResult<HttpResponse> {
    let event_id = path.into_inner();

    let event_teams = match teams::Entity::find()
        .filter(teams::Column::EventId.eq(event_id))
        .all(&**db)
        .await
    {
        Ok(teams) => teams,
        Err(e) => return Ok(error_response(&AuctionError::from(e))),
    };

    let event_players = match players::Entity::find()
        .filter(players::Column::EventId.eq(event_id))
        .all(&**db)
        .await
    {
        Ok(players) => players,
        Err(e) => return Ok(error_response(&AuctionError::from(e))),
    };

    let mut team_analytics = Vec::with_capacity(event_teams.len());
    for team in &event_teams {
        let mut category_distribution = std::collections::HashMap::new();
        for player in event_players
            .iter()
            .filter(|p| p.sold_to_team_id == Some(team.id) && p.status == PlayerStatus::Sold)
        {
            *category_distribution.entry(player.category_id).or_insert(0) += 1;
        }

        team_analytics.push(TeamAnalytics {
            team_id: team.id,
            team_name: team.name.clone(),
            total_spent: team.spent,
            players_acquired: team.players_count,
            remaining_budget: team.remaining,
            category_distribution,
        });
    }

    let mut sold_players = 0;
    let mut unsold_players = 0;
    let mut total_amount_spent: i64 = 0;
    let mut highest_bid: i64 = 0;

    for player in &event_players {
        match player.status {
            PlayerStatus::Sold => {
                sold_players += 1;
                let sold_price = player.sold_price.unwrap_or(0);
                total_amount_spent += sold_price;
                highest_bid = highest_bid.max(sold_price);
            }
            PlayerStatus::Unsold => unsold_players += 1,
            _ => {}
        }
    }

    let average_price = if sold_players > 0 {
        total_amount_spent as f64 / sold_players as f64
    } else {
        0.0
    };

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .json(AuctionAnalytics {
            event_id,
            total_players: event_players.len(),
            sold_players,
            unsold_players,
            total_amount_spent,
            highest_bid,
            average_price,
            teams: team_analytics,
        }))
}
