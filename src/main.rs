use actix_web::{web, App, HttpServer};
use actix_cors::Cors;
use std::env;
use tracing_actix_web::TracingLogger;

use auction_backend::{configure_routes, connect_and_migrate_from_env, init_tracing, load_dotenv};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    load_dotenv();

    init_tracing();

    // Connect to database and run migrations
    let db = connect_and_migrate_from_env().await;

    // Start the HTTP server
    HttpServer::new(move || {
        // Configure CORS
        let frontend_origin = env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| {
            tracing::warn!("Warning: CORS_ALLOWED_ORIGIN not set, using default");
            "http://localhost:3000".to_string()
        });

        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![http::header::AUTHORIZATION, http::header::ACCEPT])
            .allowed_header(http::header::CONTENT_TYPE)
            .supports_credentials()
            .max_age(3600);

        let db = db.clone();
        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(web::Data::new(db.clone()))
            .configure(|cfg| configure_routes(cfg, db))
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
