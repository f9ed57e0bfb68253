//! Health check handler

use actix_web::{HttpResponse, web};

use crate::AppState;
use crate::handlers::response::ApiResponse;
use crate::services::HealthStatus;

/// GET /health
///
/// 200 while healthy or degraded, 503 when the cache is unreachable.
pub async fn get_health(state: web::Data<AppState>) -> HttpResponse {
    let health = state.health.check_health().await;

    let mut builder = match health.status {
        HealthStatus::Unhealthy => HttpResponse::ServiceUnavailable(),
        HealthStatus::Healthy | HealthStatus::Degraded => HttpResponse::Ok(),
    };
    builder.json(ApiResponse::new(health))
}

pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(get_health)));
}
