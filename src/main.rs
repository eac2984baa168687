use actix_web::{web, App, HttpServer};
use actix_cors::Cors;
use tokenauth_server::{auth::handlers, health_check, AppError, AppState, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> tokenauth_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // RUST_LOG overrides the default level
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = Settings::new()?;
    info!("Configuration loaded ({} environment)", config.environment);

    let state = web::Data::new(AppState::new(config.clone())?);

    // Revoked tokens only need remembering until they would have expired anyway
    let purge_state = state.clone();
    let purge_interval = Duration::from_secs(config.auth.revocation_purge_interval_secs);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(purge_interval).await;
            let removed = purge_state.auth_service.purge_revocations();
            debug!("Revocation purge removed {} entries", removed);
        }
    });

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Starting server at {}:{}", config.server.host, config.server.port);

    HttpServer::new(move || {
        let cors = if config.cors.enabled {
            let cors_config = if config.cors.allow_any_origin {
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .supports_credentials()
            } else {
                Cors::default()
                    .allowed_origin("http://localhost:8080")
                    .allowed_origin("http://127.0.0.1:8080")
                    .allowed_methods(vec!["GET", "POST"])
                    .allowed_headers(vec!["Authorization", "Content-Type"])
                    .supports_credentials()
            };
            cors_config.max_age(config.cors.max_age as usize)
        } else {
            // CORS disabled - use most restrictive settings
            Cors::default()
        };

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .route("/health", web::get().to(health_check))
            .configure(handlers::configure)
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(())
}
