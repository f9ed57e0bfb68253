//! Shared fixtures for the HTTP tests

use std::sync::Arc;

use actix_web::web;

use crate::AppState;
use crate::config::Config;
use crate::services::MemoryCache;
use crate::services::mock_github::{LOGIN, MockGitHub};

pub const ADMIN_TOKEN: &str = "admin-token-for-tests";
pub const WEBHOOK_SECRET: &str = "It's a Secret to Everybody";

pub fn test_config() -> Config {
    let mut config = Config::for_user(LOGIN);
    config.webhook_secret = Some(WEBHOOK_SECRET.to_string());
    config.cache_admin_token = Some(ADMIN_TOKEN.to_string());
    config
}

/// App state over `github` and an empty in-memory cache
pub fn app_state(github: Arc<MockGitHub>) -> web::Data<AppState> {
    app_state_with_config(github, test_config())
}

pub fn app_state_with_config(github: Arc<MockGitHub>, config: Config) -> web::Data<AppState> {
    let store = Arc::new(MemoryCache::new(config.memory_cache_max_entries));
    web::Data::new(AppState::new(config, github, store))
}
