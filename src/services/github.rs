//! GitHub API Client
//!
//! Read-only access to the GitHub REST API. The `GitHubApi` trait is the
//! seam between the proxy and GitHub; `GitHubClient` implements it over
//! `reqwest`.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderMap};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{
    Contributor, GitHubCommit, GitHubEvent, GitHubReadme, GitHubRepo, GitHubUser,
    LanguageBreakdown, RateLimitResponse, RateLimitStatus, Readme,
};

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("gitfolio/", env!("CARGO_PKG_VERSION"));

/// Items per page requested from list endpoints (GitHub maximum)
pub const PER_PAGE: usize = 100;

/// Upper bound on pages followed for a single listing
const MAX_PAGES: usize = 10;

/// GitHub serves at most 300 public events (3 pages)
const MAX_EVENT_PAGES: usize = 3;

/// Remaining-quota level below which every response is logged as a warning
const LOW_RATE_LIMIT_THRESHOLD: u32 = 10;

/// Errors returned by GitHub API calls
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub resource not found: {0}")]
    NotFound(String),

    #[error("GitHub rate limit exhausted")]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("GitHub rejected the configured token")]
    Unauthorized,

    #[error("GitHub returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Failed to decode GitHub response: {0}")]
    Decode(String),
}

/// Read-only GitHub operations used by the proxy
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn get_user(&self, username: &str) -> Result<GitHubUser, GitHubError>;

    /// All repositories owned by the user, following pagination
    async fn list_repos(&self, username: &str) -> Result<Vec<GitHubRepo>, GitHubError>;

    async fn get_repo(&self, owner: &str, repo: &str) -> Result<GitHubRepo, GitHubError>;

    async fn get_repo_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<LanguageBreakdown, GitHubError>;

    /// Commits on the default branch, newest first, capped at `max` items.
    /// An empty repository yields an empty list.
    async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        author: Option<&str>,
        since: Option<DateTime<Utc>>,
        max: usize,
    ) -> Result<Vec<GitHubCommit>, GitHubError>;

    async fn list_contributors(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<Contributor>, GitHubError>;

    async fn get_readme(&self, owner: &str, repo: &str) -> Result<Readme, GitHubError>;

    /// Recent public events performed by the user
    async fn list_events(&self, username: &str) -> Result<Vec<GitHubEvent>, GitHubError>;

    async fn get_rate_limit(&self) -> Result<RateLimitStatus, GitHubError>;
}

/// `reqwest`-backed GitHub client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, GitHubError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GitHubError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GitHubError> {
        Self::new(
            &config.github_api_url,
            config.github_token.clone(),
            config.request_timeout(),
        )
    }

    /// Issue a GET and turn non-success statuses into errors
    async fn send(&self, path: &str, query: &[(&str, String)]) -> Result<Response, GitHubError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client
            .get(&url)
            .query(query)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GitHubError::Http(e.to_string()))?;

        let rate = RateHeaders::from_headers(response.headers());
        if let Some(remaining) = rate.remaining {
            if remaining < LOW_RATE_LIMIT_THRESHOLD {
                warn!(path = path, remaining = remaining, "GitHub rate limit nearly exhausted");
            }
        }

        let status = response.status();
        debug!(path = path, status = status.as_u16(), "GitHub response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status.as_u16(), &rate, &body, path))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GitHubError> {
        let response = self.send(path, query).await?;
        decode(response).await
    }

    /// Follow `page=N` until a short page, `max_items` or `max_pages`
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        max_items: usize,
        max_pages: usize,
    ) -> Result<Vec<T>, GitHubError> {
        let mut items = Vec::new();

        for page in 1..=max_pages {
            let mut page_query = query.to_vec();
            page_query.push(("per_page", PER_PAGE.to_string()));
            page_query.push(("page", page.to_string()));

            let response = self.send(path, &page_query).await?;
            if response.status() == StatusCode::NO_CONTENT {
                break;
            }

            let batch: Vec<T> = decode(response).await?;
            let short_page = batch.len() < PER_PAGE;
            items.extend(batch);

            if short_page || items.len() >= max_items {
                break;
            }
        }

        items.truncate(max_items);
        Ok(items)
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn get_user(&self, username: &str) -> Result<GitHubUser, GitHubError> {
        self.get_json(&format!("/users/{username}"), &[]).await
    }

    async fn list_repos(&self, username: &str) -> Result<Vec<GitHubRepo>, GitHubError> {
        let query = [
            ("type", "owner".to_string()),
            ("sort", "updated".to_string()),
        ];
        self.get_paginated(
            &format!("/users/{username}/repos"),
            &query,
            PER_PAGE * MAX_PAGES,
            MAX_PAGES,
        )
        .await
    }

    async fn get_repo(&self, owner: &str, repo: &str) -> Result<GitHubRepo, GitHubError> {
        self.get_json(&format!("/repos/{owner}/{repo}"), &[]).await
    }

    async fn get_repo_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<LanguageBreakdown, GitHubError> {
        self.get_json(&format!("/repos/{owner}/{repo}/languages"), &[])
            .await
    }

    async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        author: Option<&str>,
        since: Option<DateTime<Utc>>,
        max: usize,
    ) -> Result<Vec<GitHubCommit>, GitHubError> {
        let mut query = Vec::new();
        if let Some(author) = author {
            query.push(("author", author.to_string()));
        }
        if let Some(since) = since {
            query.push(("since", since.to_rfc3339()));
        }

        let max_pages = max.div_ceil(PER_PAGE).clamp(1, MAX_PAGES);
        let path = format!("/repos/{owner}/{repo}/commits");

        match self.get_paginated(&path, &query, max, max_pages).await {
            // GitHub answers 409 Conflict for repositories without commits
            Err(GitHubError::Upstream { status: 409, .. }) => Ok(Vec::new()),
            other => other,
        }
    }

    async fn list_contributors(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<Contributor>, GitHubError> {
        self.get_paginated(
            &format!("/repos/{owner}/{repo}/contributors"),
            &[],
            PER_PAGE,
            1,
        )
        .await
    }

    async fn get_readme(&self, owner: &str, repo: &str) -> Result<Readme, GitHubError> {
        let raw: GitHubReadme = self
            .get_json(&format!("/repos/{owner}/{repo}/readme"), &[])
            .await?;
        decode_readme(repo, raw)
    }

    async fn list_events(&self, username: &str) -> Result<Vec<GitHubEvent>, GitHubError> {
        self.get_paginated(
            &format!("/users/{username}/events/public"),
            &[],
            PER_PAGE * MAX_EVENT_PAGES,
            MAX_EVENT_PAGES,
        )
        .await
    }

    async fn get_rate_limit(&self) -> Result<RateLimitStatus, GitHubError> {
        let response: RateLimitResponse = self.get_json("/rate_limit", &[]).await?;
        Ok(response.resources.core.into())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GitHubError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| GitHubError::Http(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| GitHubError::Decode(e.to_string()))
}

/// Rate limit headers attached to every GitHub response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateHeaders {
    pub remaining: Option<u32>,
    pub reset: Option<i64>,
}

impl RateHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .map(str::to_string)
        };

        Self {
            remaining: read("x-ratelimit-remaining").and_then(|v| v.parse().ok()),
            reset: read("x-ratelimit-reset").and_then(|v| v.parse().ok()),
        }
    }
}

/// Map a non-success GitHub status to an error
pub fn classify_status(status: u16, rate: &RateHeaders, body: &str, path: &str) -> GitHubError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    let rate_limited = status == 429 || (status == 403 && rate.remaining == Some(0));

    match status {
        404 => GitHubError::NotFound(path.trim_start_matches('/').to_string()),
        401 => GitHubError::Unauthorized,
        _ if rate_limited => GitHubError::RateLimited {
            reset_at: rate.reset.and_then(|r| DateTime::from_timestamp(r, 0)),
        },
        _ => GitHubError::Upstream { status, message },
    }
}

/// Decode a base64 README payload into text
pub fn decode_readme(repo: &str, raw: GitHubReadme) -> Result<Readme, GitHubError> {
    let content = if raw.encoding == "base64" {
        let compact: String = raw.content.split_whitespace().collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| GitHubError::Decode(format!("Invalid README encoding: {e}")))?;
        String::from_utf8_lossy(&bytes).into_owned()
    } else {
        raw.content
    };

    Ok(Readme {
        repo: repo.to_string(),
        name: raw.name,
        html_url: raw.html_url,
        content,
    })
}
