pub mod admin_auth;
pub mod cache;
pub mod classification;
pub mod github;
pub mod health;
pub mod metrics;
pub mod portfolio;
pub mod webhook;

#[cfg(test)]
pub(crate) mod mock_github;

pub use admin_auth::{AdminAuth, AuthError, CacheAdmin};
pub use cache::{
    CacheError, CacheMetrics, CacheService, CacheStats, CacheStatus, CacheStore, Cached,
    MemoryCache, RedisCache, build_store,
};
pub use github::{GitHubApi, GitHubClient, GitHubError};
pub use health::{CacheHealth, GitHubHealth, HealthService, HealthStatus, SystemHealth};
pub use portfolio::{PortfolioError, PortfolioService};
pub use webhook::{
    DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER, WebhookError, WebhookService,
    WebhookVerifier, invalidation_plan, sign_payload,
};
