//! Cache statistics and administration

use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::info;

use crate::AppState;
use crate::error::AppError;
use crate::handlers::response::ApiResponse;
use crate::services::CacheAdmin;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheClearResponse {
    pub cleared_keys: usize,
}

/// GET /v1/cache/stats
pub async fn get_cache_stats(state: web::Data<AppState>) -> HttpResponse {
    let stats = state.portfolio.cache().stats();
    HttpResponse::Ok().json(ApiResponse::new(stats))
}

/// DELETE /v1/cache
///
/// Requires `Authorization: Bearer <CACHE_ADMIN_TOKEN>`.
pub async fn clear_cache(
    state: web::Data<AppState>,
    _admin: CacheAdmin,
) -> Result<HttpResponse, AppError> {
    let cleared_keys = state.portfolio.cache().clear().await?;
    info!(cleared_keys, "Cache cleared by admin");
    Ok(HttpResponse::Ok().json(ApiResponse::new(CacheClearResponse { cleared_keys })))
}

pub fn configure_cache_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/cache/stats").route(web::get().to(get_cache_stats)))
        .service(web::resource("/cache").route(web::delete().to(clear_cache)));
}
