//! Profile and activity handlers

use actix_web::{HttpResponse, web};

use crate::AppState;
use crate::error::AppError;
use crate::handlers::response::{ApiResponse, cached_response};
use crate::models::LimitQuery;

/// GET /v1/profile
pub async fn get_profile(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let profile = state.portfolio.profile().await?;
    Ok(cached_response(profile))
}

/// GET /v1/activity
///
/// Query Parameters:
/// - limit: Maximum number of events. Default: 30, Max: 100
pub async fn get_activity(
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, AppError> {
    let activity = state.portfolio.activity(query.limit).await?;
    Ok(cached_response(activity))
}

/// GET /v1/rate-limit
///
/// Always answered live from GitHub.
pub async fn get_rate_limit(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let rate_limit = state.portfolio.rate_limit().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(rate_limit)))
}

pub fn configure_profile_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/profile").route(web::get().to(get_profile)))
        .service(web::resource("/activity").route(web::get().to(get_activity)))
        .service(web::resource("/rate-limit").route(web::get().to(get_rate_limit)));
}
