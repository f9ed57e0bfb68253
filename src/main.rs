use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gitfolio::services::{GitHubApi, GitHubClient, build_store};
use gitfolio::{AppState, Config, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gitfolio=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");

    info!(
        username = %config.github_username,
        authenticated = config.github_token.is_some(),
        "Starting Gitfolio server on {}:{}",
        config.host,
        config.port
    );

    let github: Arc<dyn GitHubApi> = match GitHubClient::from_config(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!(error = %e, "Failed to build GitHub client");
            std::process::exit(1);
        }
    };

    let store = match build_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Failed to connect to cache backend");
            std::process::exit(1);
        }
    };

    let server_addr = format!("{}:{}", config.host, config.port);
    let app_state = web::Data::new(AppState::new(config, github, store));

    if !app_state.webhooks.is_configured() {
        warn!("WEBHOOK_SECRET not set. Webhook deliveries will be rejected.");
    }
    if !app_state.admin_auth.is_configured() {
        warn!("CACHE_ADMIN_TOKEN not set. DELETE /v1/cache is disabled.");
    }

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(handlers::configure_routes)
    })
    .bind(&server_addr)?
    .run()
    .await
}
