use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use std::fmt;

/// Application-level error type
#[derive(Debug)]
pub enum AppError {
    /// Validation error
    Validation(String),
    /// Not found error
    NotFound(String),
    /// Authentication error (bad webhook signature, bad admin token)
    Unauthorized(String),
    /// GitHub rate limit exhausted
    RateLimited { retry_after: u64 },
    /// GitHub answered with an unexpected error
    Upstream(String),
    /// A required backend (cache) is unreachable
    Unavailable(String),
    /// Internal server error
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
    meta: ErrorMeta,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorMeta {
    request_id: String,
}

impl AppError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::RateLimited { retry_after } => {
                write!(f, "GitHub rate limit exhausted, retry after {retry_after} seconds")
            }
            Self::Upstream(msg) => write!(f, "GitHub error: {msg}"),
            Self::Unavailable(msg) => write!(f, "Service unavailable: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse {
            error: ErrorBody {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
            meta: ErrorMeta {
                request_id: uuid::Uuid::new_v4().to_string(),
            },
        };

        let mut builder = HttpResponse::build(self.status_code());
        if let Self::RateLimited { retry_after } = self {
            builder.insert_header(("Retry-After", retry_after.to_string()));
        }
        builder.json(error_response)
    }
}

impl From<crate::services::GitHubError> for AppError {
    fn from(err: crate::services::GitHubError) -> Self {
        use crate::services::GitHubError;

        match err {
            GitHubError::NotFound(what) => Self::NotFound(what),
            GitHubError::RateLimited { reset_at } => {
                let retry_after = reset_at
                    .map(|reset| (reset - chrono::Utc::now()).num_seconds().max(1) as u64)
                    .unwrap_or(60);
                Self::RateLimited { retry_after }
            }
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl From<crate::services::PortfolioError> for AppError {
    fn from(err: crate::services::PortfolioError) -> Self {
        use crate::services::PortfolioError;

        match err {
            PortfolioError::GitHub(e) => e.into(),
            PortfolioError::InvalidQuery(msg) => Self::Validation(msg),
            PortfolioError::ProjectNotFound(name) => Self::NotFound(format!("project {name}")),
        }
    }
}

impl From<crate::services::CacheError> for AppError {
    fn from(err: crate::services::CacheError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<crate::services::WebhookError> for AppError {
    fn from(err: crate::services::WebhookError) -> Self {
        use crate::services::WebhookError;

        match err {
            WebhookError::MissingHeader(_) | WebhookError::InvalidPayload(_) => {
                Self::Validation(err.to_string())
            }
            WebhookError::NotConfigured
            | WebhookError::MalformedSignature(_)
            | WebhookError::SignatureMismatch => Self::Unauthorized(err.to_string()),
            WebhookError::Cache(e) => e.into(),
        }
    }
}
