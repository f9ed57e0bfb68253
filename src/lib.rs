//! Gitfolio - a caching proxy over the GitHub REST API
//!
//! Serves one account's profile, repositories and activity, plus derived
//! portfolio metrics and project classification, from a Redis or
//! in-memory cache.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::AppError;

use services::{
    AdminAuth, CacheService, CacheStore, GitHubApi, HealthService, PortfolioService,
    WebhookService, WebhookVerifier,
};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub portfolio: PortfolioService,
    pub webhooks: WebhookService,
    pub health: HealthService,
    pub admin_auth: AdminAuth,
}

impl AppState {
    /// Wire the services around one GitHub client and one cache store
    pub fn new(config: Config, github: Arc<dyn GitHubApi>, store: Arc<dyn CacheStore>) -> Self {
        let cache = CacheService::new(store, &config.github_username);
        let portfolio = PortfolioService::new(Arc::clone(&github), cache.clone(), &config);
        let webhooks = WebhookService::new(
            WebhookVerifier::new(config.webhook_secret.as_deref()),
            cache.clone(),
        );
        let health = HealthService::new(cache, github);
        let admin_auth = AdminAuth::new(config.cache_admin_token.clone());

        Self {
            config,
            portfolio,
            webhooks,
            health,
            admin_auth,
        }
    }
}
