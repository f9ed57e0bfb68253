//! Response envelope shared by all handlers

use actix_web::HttpResponse;
use serde::Serialize;

use crate::services::Cached;

/// Reports whether the body came from the cache (`HIT`) or GitHub (`MISS`)
pub const CACHE_HEADER: &str = "X-Cache";

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    data: T,
    meta: ResponseMeta,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponseMeta {
    request_id: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta {
                request_id: uuid::Uuid::new_v4().to_string(),
            },
        }
    }
}

/// 200 with the envelope and the `X-Cache` header
pub fn cached_response<T: Serialize>(cached: Cached<T>) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((CACHE_HEADER, cached.status.as_str()))
        .json(ApiResponse::new(cached.value))
}
