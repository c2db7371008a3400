pub mod auction_management;
pub mod bootstrap;
pub mod dto;
pub mod entity;
pub mod jwt;
pub mod user_management;

pub use bootstrap::{connect_and_migrate_from_env, init_tracing, load_dotenv};

use actix_web::web;
use sea_orm::DatabaseConnection;

use auction_management::{
    complete_auction, create_category, create_event, create_player, create_team, finalize_sale,
    get_auction_state, get_category_players, get_event, get_event_analytics, get_event_categories,
    get_event_teams, get_events, get_player, get_team, get_team_budget, next_player, pause_auction,
    place_bid, release_player, resume_auction, start_auction,
};
use jwt::{get_claims, get_user, JwtAuth};

/// Configure all routes for the application
pub fn configure_routes(cfg: &mut actix_web::web::ServiceConfig, db: DatabaseConnection) {
    cfg.service(hello).service(
        web::scope("/api")
            .wrap(JwtAuth::new(db))
            .service(protected_route)
            .service(create_event)
            .service(get_events)
            .service(get_event)
            .service(create_category)
            .service(get_event_categories)
            .service(create_team)
            .service(get_event_teams)
            .service(get_team_budget)
            .service(get_team)
            .service(create_player)
            .service(get_category_players)
            .service(release_player)
            .service(get_player)
            .service(start_auction)
            .service(pause_auction)
            .service(resume_auction)
            .service(complete_auction)
            .service(next_player)
            .service(get_auction_state)
            .service(place_bid)
            .service(finalize_sale)
            .service(get_event_analytics),
    );
}

#[actix_web::get("/")]
async fn hello() -> impl actix_web::Responder {
    "Hello, Auction!"
}

#[actix_web::get("/protected")]
async fn protected_route(
    req: actix_web::HttpRequest,
) -> actix_web::Result<actix_web::HttpResponse> {
    // Extract claims and user from the request (set by JWT middleware)
    if let Some(claims) = get_claims(&req) {
        if let Some(user) = get_user(&req) {
            Ok(actix_web::HttpResponse::Ok()
                .content_type("application/json")
                .json(serde_json::json!({
                    "message": "Access granted to protected route",
                    "user": {
                        "id": user.id,
                        "external_id": user.external_id,
                        "email": user.email,
                        "display_name": user.display_name,
                        "role": user.role,
                        "team_id": user.team_id,
                        "created_at": user.created_at
                    },
                    "token_info": {
                        "sub": claims.sub,
                        "email": claims.email,
                        "issued_at": claims.iat,
                        "expires_at": claims.exp
                    }
                })))
        } else {
            Ok(actix_web::HttpResponse::InternalServerError()
                .content_type("application/json")
                .json(serde_json::json!({
                    "error": "User not found"
                })))
        }
    } else {
        // This should never happen if middleware is working correctly
        Ok(actix_web::HttpResponse::Unauthorized()
            .content_type("application/json")
            .json(serde_json::json!({
                "error": "No claims found"
            })))
    }
}
