//! GitHub webhook receiver

use actix_web::{HttpRequest, HttpResponse, web};

use crate::AppState;
use crate::error::AppError;
use crate::handlers::response::ApiResponse;
use crate::services::{DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER};

/// GitHub caps webhook payloads at 25 MB
const MAX_WEBHOOK_PAYLOAD_BYTES: usize = 25 * 1024 * 1024;

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// POST /v1/webhooks/github
///
/// The signature is checked against the raw body before it is parsed.
pub async fn receive_github_webhook(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let response = state
        .webhooks
        .handle_delivery(
            header(&req, EVENT_HEADER),
            header(&req, DELIVERY_HEADER),
            header(&req, SIGNATURE_HEADER),
            &body,
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::new(response)))
}

pub fn configure_webhook_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/webhooks/github")
            .app_data(web::PayloadConfig::new(MAX_WEBHOOK_PAYLOAD_BYTES))
            .route(web::post().to(receive_github_webhook)),
    );
}
