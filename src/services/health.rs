//! Health Service
//!
//! Reports cache reachability and the remaining GitHub quota for
//! `GET /health`.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::RateLimitStatus;
use crate::services::cache::CacheService;
use crate::services::github::GitHubApi;

/// Overall system health status
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All components are functioning normally
    Healthy,
    /// GitHub is unreachable or out of quota; cached data is still served
    Degraded,
    /// The cache is unreachable
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub cache: CacheHealth,
    pub github: GitHubHealth,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheHealth {
    pub status: HealthStatus,
    /// `redis` or `memory`
    pub backend: String,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubHealth {
    pub status: HealthStatus,
    pub rate_limit: Option<RateLimitStatus>,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct HealthService {
    cache: CacheService,
    github: Arc<dyn GitHubApi>,
}

impl HealthService {
    pub fn new(cache: CacheService, github: Arc<dyn GitHubApi>) -> Self {
        Self { cache, github }
    }

    /// Check every component concurrently; overall status is the worst one
    pub async fn check_health(&self) -> SystemHealth {
        let (cache, github) = tokio::join!(self.check_cache(), self.check_github());

        let status = Self::determine_overall_status(&cache, &github);

        SystemHealth {
            status,
            cache,
            github,
            checked_at: Utc::now(),
        }
    }

    pub async fn check_cache(&self) -> CacheHealth {
        let start = Instant::now();
        let result = self.cache.ping().await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => CacheHealth {
                status: HealthStatus::Healthy,
                backend: self.cache.backend_name().to_string(),
                latency_ms: Some(latency_ms),
                error: None,
            },
            Err(e) => {
                tracing::error!(error = %e, "Cache health check failed");
                CacheHealth {
                    status: HealthStatus::Unhealthy,
                    backend: self.cache.backend_name().to_string(),
                    latency_ms: None,
                    error: Some(format!("Cache ping failed: {e}")),
                }
            }
        }
    }

    pub async fn check_github(&self) -> GitHubHealth {
        let start = Instant::now();
        let result = self.github.get_rate_limit().await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(rate_limit) => {
                // Out of quota: only cached data can be served until reset
                let status = if rate_limit.remaining == 0 {
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Healthy
                };

                GitHubHealth {
                    status,
                    rate_limit: Some(rate_limit),
                    latency_ms: Some(latency_ms),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "GitHub health check failed");
                GitHubHealth {
                    status: HealthStatus::Degraded,
                    rate_limit: None,
                    latency_ms: None,
                    error: Some(format!("GitHub unreachable: {e}")),
                }
            }
        }
    }

    fn determine_overall_status(cache: &CacheHealth, github: &GitHubHealth) -> HealthStatus {
        let statuses = [cache.status, github.status];

        if statuses.contains(&HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if statuses.contains(&HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}
