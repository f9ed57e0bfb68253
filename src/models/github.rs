//! GitHub REST API shapes
//!
//! These mirror the JSON GitHub returns. Unknown fields are ignored and
//! everything that GitHub may omit or null is optional or defaulted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `GET /users/{username}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitHubUser {
    pub login: String,
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub avatar_url: String,
    pub html_url: String,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub public_gists: u32,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `GET /users/{username}/repos` item and `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitHubRepo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub watchers_count: u32,
    #[serde(default)]
    pub open_issues_count: u32,
    #[serde(default)]
    pub size: u64,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
}

fn default_branch() -> String {
    "main".to_string()
}

/// `GET /repos/{owner}/{repo}/languages`: language name to bytes of code
pub type LanguageBreakdown = BTreeMap<String, u64>;

/// `GET /repos/{owner}/{repo}/commits` item
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommit {
    pub sha: String,
    pub html_url: String,
    pub commit: CommitDetail,
    #[serde(default)]
    pub author: Option<CommitAccount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    pub author: CommitSignature,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitSignature {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAccount {
    pub login: String,
}

/// Flattened commit as served by the proxy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub sha: String,
    pub repo: String,
    /// First line of the commit message
    pub message: String,
    pub author_name: String,
    pub author_login: Option<String>,
    pub date: DateTime<Utc>,
    pub url: String,
}

impl CommitSummary {
    pub fn from_commit(repo: &str, commit: GitHubCommit) -> Self {
        let message = commit
            .commit
            .message
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        Self {
            sha: commit.sha,
            repo: repo.to_string(),
            message,
            author_name: commit.commit.author.name,
            author_login: commit.author.map(|a| a.login),
            date: commit.commit.author.date,
            url: commit.html_url,
        }
    }
}

/// `GET /repos/{owner}/{repo}/contributors` item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contributor {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
    pub contributions: u32,
}

/// `GET /repos/{owner}/{repo}/readme`
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubReadme {
    pub name: String,
    pub html_url: String,
    #[serde(default)]
    pub encoding: String,
    #[serde(default)]
    pub content: String,
}

/// Decoded README as served by the proxy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Readme {
    pub repo: String,
    pub name: String,
    pub html_url: String,
    pub content: String,
}

/// `GET /users/{username}/events/public` item
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub repo: EventRepo,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRepo {
    pub name: String,
}

/// Flattened activity item as served by the proxy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub id: String,
    pub event_type: String,
    pub repo: String,
    pub created_at: DateTime<Utc>,
    pub summary: String,
}

impl ActivityItem {
    pub fn from_event(event: GitHubEvent) -> Self {
        let summary = summarize_event(&event.event_type, &event.payload);
        Self {
            id: event.id,
            event_type: event.event_type,
            repo: event.repo.name,
            created_at: event.created_at,
            summary,
        }
    }
}

/// One-line description of an event payload
fn summarize_event(event_type: &str, payload: &serde_json::Value) -> String {
    let action = payload["action"].as_str().unwrap_or("updated");

    match event_type {
        "PushEvent" => {
            let count = payload["size"]
                .as_u64()
                .or_else(|| payload["commits"].as_array().map(|c| c.len() as u64))
                .unwrap_or(0);
            let branch = payload["ref"]
                .as_str()
                .map(|r| r.trim_start_matches("refs/heads/"))
                .unwrap_or("a branch");
            let noun = if count == 1 { "commit" } else { "commits" };
            format!("pushed {count} {noun} to {branch}")
        }
        "PullRequestEvent" => {
            let number = payload["number"].as_u64().unwrap_or_default();
            format!("{action} pull request #{number}")
        }
        "IssuesEvent" => {
            let number = payload["issue"]["number"].as_u64().unwrap_or_default();
            format!("{action} issue #{number}")
        }
        "IssueCommentEvent" => {
            let number = payload["issue"]["number"].as_u64().unwrap_or_default();
            format!("commented on #{number}")
        }
        "CreateEvent" => {
            let ref_type = payload["ref_type"].as_str().unwrap_or("repository");
            match payload["ref"].as_str() {
                Some(name) => format!("created {ref_type} {name}"),
                None => format!("created {ref_type}"),
            }
        }
        "DeleteEvent" => {
            let ref_type = payload["ref_type"].as_str().unwrap_or("branch");
            let name = payload["ref"].as_str().unwrap_or_default();
            format!("deleted {ref_type} {name}").trim_end().to_string()
        }
        "WatchEvent" => "starred the repository".to_string(),
        "ForkEvent" => "forked the repository".to_string(),
        "ReleaseEvent" => {
            let tag = payload["release"]["tag_name"].as_str().unwrap_or_default();
            format!("{action} release {tag}").trim_end().to_string()
        }
        "PublicEvent" => "made the repository public".to_string(),
        "PullRequestReviewEvent" => "reviewed a pull request".to_string(),
        other => other.trim_end_matches("Event").to_lowercase(),
    }
}

/// `GET /rate_limit`
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitWindow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitWindow {
    pub limit: u32,
    pub remaining: u32,
    #[serde(default)]
    pub used: u32,
    /// Unix epoch seconds
    pub reset: i64,
}

/// Core rate limit as served by the proxy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    pub used: u32,
    pub reset_at: DateTime<Utc>,
}

impl From<RateLimitWindow> for RateLimitStatus {
    fn from(window: RateLimitWindow) -> Self {
        Self {
            limit: window.limit,
            remaining: window.remaining,
            used: window.used,
            reset_at: DateTime::from_timestamp(window.reset, 0).unwrap_or_else(Utc::now),
        }
    }
}
