use actix_web::web;

use crate::error::AppError;

pub mod cache;
pub mod health;
pub mod metrics;
pub mod profile;
pub mod projects;
pub mod repos;
pub mod response;
pub mod webhooks;

#[cfg(test)]
mod test_support;







pub use cache::configure_cache_routes;
pub use health::configure_health_routes;
pub use metrics::configure_metrics_routes;
pub use profile::configure_profile_routes;
pub use projects::configure_project_routes;
pub use repos::configure_repo_routes;
pub use webhooks::configure_webhook_routes;

/// Register every route: `/health` at the root and the API under `/v1`.
///
/// Malformed query strings are answered with the standard error envelope.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .configure(configure_health_routes)
    .service(
        web::scope("/v1")
            .configure(configure_profile_routes)
            .configure(configure_repo_routes)
            .configure(configure_project_routes)
            .configure(configure_metrics_routes)
            .configure(configure_webhook_routes)
            .configure(configure_cache_routes),
    );
}
