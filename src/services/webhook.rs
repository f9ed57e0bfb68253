//! GitHub Webhook Service
//!
//! Verifies `X-Hub-Signature-256` signatures and turns each delivery into
//! an invalidation plan: the cache key prefixes made stale by the event.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{WebhookPayload, WebhookResponse};
use crate::services::cache::{CacheError, CacheService};

pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";
pub const EVENT_HEADER: &str = "X-GitHub-Event";
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

const SIGNATURE_PREFIX: &str = "sha256=";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Missing header: {0}")]
    MissingHeader(String),

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Webhook secret is not configured")]
    NotConfigured,

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Webhook signature does not match")]
    SignatureMismatch,

    #[error("Cache invalidation failed: {0}")]
    Cache(#[from] CacheError),
}

/// HMAC-SHA256 signature check with the shared webhook secret
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Option<Vec<u8>>,
}

impl WebhookVerifier {
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret: secret.map(|s| s.as_bytes().to_vec()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Check `signature` (the raw header value) against `body`
    pub fn verify(&self, signature: Option<&str>, body: &[u8]) -> Result<(), WebhookError> {
        let secret = self.secret.as_deref().ok_or(WebhookError::NotConfigured)?;

        let signature = signature.ok_or_else(|| {
            WebhookError::MalformedSignature(format!("{SIGNATURE_HEADER} header is missing"))
        })?;

        let hex_digest = signature.trim().strip_prefix(SIGNATURE_PREFIX).ok_or_else(|| {
            WebhookError::MalformedSignature(format!("expected {SIGNATURE_PREFIX}<hex>"))
        })?;

        let expected = hex::decode(hex_digest)
            .map_err(|e| WebhookError::MalformedSignature(e.to_string()))?;

        let mut mac = HmacSha256::new_from_slice(secret)
            .map_err(|_| WebhookError::NotConfigured)?;
        mac.update(body);

        // verify_slice compares in constant time
        mac.verify_slice(&expected)
            .map_err(|_| WebhookError::SignatureMismatch)
    }
}

/// `sha256=<hex>` signature of `body`, as GitHub sends it
pub fn sign_payload(secret: &str, body: &[u8]) -> Result<String, WebhookError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| WebhookError::NotConfigured)?;
    mac.update(body);
    Ok(format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Cache key prefixes invalidated by one event.
///
/// Repository-scoped prefixes are skipped when the payload names no
/// repository.
pub fn invalidation_plan(event: &str, repo: Option<&str>) -> Vec<String> {
    let repo = repo.map(str::to_lowercase);
    let repo_prefix = repo.as_ref().map(|name| format!("repo:{name}:"));
    let repo_key = |suffix: &str| repo.as_ref().map(|name| format!("repo:{name}:{suffix}"));

    let plan: Vec<Option<String>> = match event {
        "ping" => Vec::new(),
        "push" => vec![
            repo_prefix,
            Some("commits".into()),
            Some("events".into()),
            Some("metrics:".into()),
        ],
        "repository" | "public" | "create" | "delete" | "release" => vec![
            Some("repos".into()),
            repo_prefix,
            Some("projects".into()),
            Some("metrics:".into()),
            Some("events".into()),
        ],
        "star" | "watch" | "fork" => vec![
            Some("repos".into()),
            repo_prefix,
            Some("projects".into()),
            Some("metrics:summary".into()),
        ],
        "member" | "pull_request" | "issues" => {
            vec![repo_key("contributors"), Some("events".into())]
        }
        _ => vec![Some("events".into())],
    };

    plan.into_iter().flatten().collect()
}

/// Verifies deliveries and applies their invalidation plans
#[derive(Clone)]
pub struct WebhookService {
    verifier: WebhookVerifier,
    cache: CacheService,
}

impl WebhookService {
    pub fn new(verifier: WebhookVerifier, cache: CacheService) -> Self {
        Self { verifier, cache }
    }

    pub fn is_configured(&self) -> bool {
        self.verifier.is_configured()
    }

    /// Handle one delivery: verify, parse, invalidate
    pub async fn handle_delivery(
        &self,
        event: Option<&str>,
        delivery_id: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<WebhookResponse, WebhookError> {
        self.verifier.verify(signature, body)?;

        let event = event
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| WebhookError::MissingHeader(EVENT_HEADER.to_string()))?;

        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

        let repository = payload.repository.map(|r| r.name);

        debug!(
            event = %event,
            delivery_id = ?delivery_id,
            repository = ?repository,
            action = ?payload.action,
            "Webhook verified"
        );

        if event == "ping" {
            return Ok(WebhookResponse {
                event: event.to_string(),
                delivery_id: delivery_id.map(str::to_string),
                repository,
                invalidated_prefixes: Vec::new(),
                invalidated_keys: 0,
                message: Some("pong".to_string()),
            });
        }

        let prefixes = invalidation_plan(event, repository.as_deref());

        let mut invalidated_keys = 0;
        for prefix in &prefixes {
            match self.cache.invalidate_prefix(prefix).await {
                Ok(count) => invalidated_keys += count,
                Err(e) => {
                    warn!(prefix = %prefix, error = %e, "Webhook invalidation failed");
                    return Err(e.into());
                }
            }
        }

        info!(
            event = %event,
            delivery_id = ?delivery_id,
            repository = ?repository,
            invalidated_keys,
            "Cache invalidated by webhook"
        );

        Ok(WebhookResponse {
            event: event.to_string(),
            delivery_id: delivery_id.map(str::to_string),
            repository,
            invalidated_prefixes: prefixes,
            invalidated_keys,
            message: None,
        })
    }
}
