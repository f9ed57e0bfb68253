//! Metrics handlers

use actix_web::{HttpResponse, web};

use crate::AppState;
use crate::error::AppError;
use crate::handlers::response::cached_response;

/// GET /v1/metrics/languages
pub async fn get_language_metrics(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(cached_response(state.portfolio.language_metrics().await?))
}

/// GET /v1/metrics/technologies
pub async fn get_technology_metrics(
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    Ok(cached_response(state.portfolio.technology_metrics().await?))
}

/// GET /v1/metrics/streaks
pub async fn get_streaks(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(cached_response(state.portfolio.streaks().await?))
}

/// GET /v1/metrics/productivity
pub async fn get_productivity(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(cached_response(state.portfolio.productivity().await?))
}

/// GET /v1/metrics/timeline
pub async fn get_timeline(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(cached_response(state.portfolio.timeline().await?))
}

/// GET /v1/metrics/summary
pub async fn get_summary(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(cached_response(state.portfolio.summary().await?))
}

pub fn configure_metrics_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/metrics")
            .route("/languages", web::get().to(get_language_metrics))
            .route("/technologies", web::get().to(get_technology_metrics))
            .route("/streaks", web::get().to(get_streaks))
            .route("/productivity", web::get().to(get_productivity))
            .route("/timeline", web::get().to(get_timeline))
            .route("/summary", web::get().to(get_summary)),
    );
}
