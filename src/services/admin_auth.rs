//! Admin Authentication
//!
//! Guards destructive cache operations behind a static bearer token
//! (`CACHE_ADMIN_TOKEN`). With no token configured every admin request
//! is refused.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use thiserror::Error;

use crate::AppState;
use crate::error::AppError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Admin token is not configured")]
    NotConfigured,

    #[error("Missing or malformed Authorization header")]
    MissingToken,

    #[error("Invalid admin token")]
    InvalidToken,
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[derive(Debug, Clone)]
pub struct AdminAuth {
    token: Option<String>,
}

impl AdminAuth {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    /// Check a presented bearer token against the configured one
    pub fn authorize(&self, presented: Option<&str>) -> Result<(), AuthError> {
        let expected = self.token.as_deref().ok_or(AuthError::NotConfigured)?;
        let presented = presented.ok_or(AuthError::MissingToken)?;

        if constant_time_eq(presented, expected) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

/// Extract Bearer token from Authorization header
///
/// Expected format: "Bearer <token>"
fn extract_bearer_token(req: &HttpRequest) -> Option<&str> {
    let auth_str = req.headers().get("Authorization")?.to_str().ok()?;

    if auth_str.len() > 7 && auth_str[..7].eq_ignore_ascii_case("Bearer ") {
        Some(auth_str[7..].trim())
    } else {
        None
    }
}

/// Proof that the request carried the admin token.
///
/// Taking `CacheAdmin` as a handler argument rejects the request with 401
/// before the handler runs.
#[derive(Debug, Clone, Copy)]
pub struct CacheAdmin;

impl FromRequest for CacheAdmin {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            tracing::error!("AppState not configured in app data");
            return ready(Err(AppError::Internal(
                "Authentication service not configured".to_string(),
            )));
        };

        let result = state
            .admin_auth
            .authorize(extract_bearer_token(req))
            .map(|()| CacheAdmin)
            .map_err(|e| {
                tracing::debug!(error = %e, "Admin request rejected");
                AppError::Unauthorized(e.to_string())
            });

        ready(result)
    }
}
