//! GitHub webhook payload and response types

use serde::{Deserialize, Serialize};

/// The subset of a webhook payload used to scope invalidation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub repository: Option<WebhookRepository>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookRepository {
    pub name: String,
}

/// Result of a processed webhook delivery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub event: String,
    pub delivery_id: Option<String>,
    pub repository: Option<String>,
    pub invalidated_prefixes: Vec<String>,
    pub invalidated_keys: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
