//! In-memory `GitHubApi` for tests, with per-method call counters

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::models::{
    CommitAccount, CommitDetail, CommitSignature, Contributor, EventRepo, GitHubCommit,
    GitHubEvent, GitHubRepo, GitHubUser, LanguageBreakdown, RateLimitStatus, Readme,
};
use crate::services::github::{GitHubApi, GitHubError};

pub const LOGIN: &str = "octocat";

pub fn repo(name: &str) -> GitHubRepo {
    GitHubRepo {
        id: 1,
        name: name.to_string(),
        full_name: format!("{LOGIN}/{name}"),
        description: None,
        html_url: format!("https://github.com/{LOGIN}/{name}"),
        homepage: None,
        language: None,
        topics: Vec::new(),
        fork: false,
        archived: false,
        stargazers_count: 0,
        forks_count: 0,
        watchers_count: 0,
        open_issues_count: 0,
        size: 0,
        default_branch: "main".to_string(),
        created_at: Utc.with_ymd_and_hms(2023, 1, 15, 0, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        pushed_at: None,
    }
}

/// A commit authored by `octocat` at `date`
pub fn commit(date: DateTime<Utc>) -> GitHubCommit {
    let sha = format!("{:040x}", date.timestamp_micros());
    GitHubCommit {
        html_url: format!("https://github.com/{LOGIN}/repo/commit/{sha}"),
        sha,
        commit: CommitDetail {
            message: "Update\n\nDetails".to_string(),
            author: CommitSignature {
                name: "The Octocat".to_string(),
                email: None,
                date,
            },
        },
        author: Some(CommitAccount {
            login: LOGIN.to_string(),
        }),
    }
}

pub fn user() -> GitHubUser {
    GitHubUser {
        login: LOGIN.to_string(),
        id: 1,
        name: Some("The Octocat".to_string()),
        bio: None,
        company: None,
        blog: None,
        location: None,
        avatar_url: format!("https://avatars.example/{LOGIN}"),
        html_url: format!("https://github.com/{LOGIN}"),
        public_repos: 0,
        public_gists: 0,
        followers: 10,
        following: 0,
        created_at: Utc.with_ymd_and_hms(2015, 3, 1, 0, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
    }
}

#[derive(Default)]
pub struct MockGitHub {
    repos: Vec<GitHubRepo>,
    languages: HashMap<String, LanguageBreakdown>,
    commits: HashMap<String, Vec<GitHubCommit>>,
    events: Vec<GitHubEvent>,
    failing: HashSet<String>,
    rate_limit_remaining: Option<u32>,
    unreachable: bool,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl MockGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repos(mut self, repos: Vec<GitHubRepo>) -> Self {
        self.repos = repos;
        self
    }

    pub fn with_languages(mut self, repo: &str, languages: &[(&str, u64)]) -> Self {
        self.languages.insert(
            repo.to_string(),
            languages
                .iter()
                .map(|(name, bytes)| (name.to_string(), *bytes))
                .collect(),
        );
        self
    }

    /// Commits newest first, as GitHub returns them
    pub fn with_commits(mut self, repo: &str, mut commits: Vec<GitHubCommit>) -> Self {
        commits.sort_by(|a, b| b.commit.author.date.cmp(&a.commit.author.date));
        self.commits.insert(repo.to_string(), commits);
        self
    }

    pub fn with_events(mut self, count: usize) -> Self {
        self.events = (0..count)
            .map(|i| GitHubEvent {
                id: i.to_string(),
                event_type: "WatchEvent".to_string(),
                repo: EventRepo {
                    name: format!("someone/project-{i}"),
                },
                created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
                payload: serde_json::json!({"action": "started"}),
            })
            .collect();
        self
    }

    /// Per-repository calls for `repo` fail with a 500
    pub fn failing_repo(mut self, repo: &str) -> Self {
        self.failing.insert(repo.to_string());
        self
    }

    pub fn with_rate_limit_remaining(mut self, remaining: u32) -> Self {
        self.rate_limit_remaining = Some(remaining);
        self
    }

    /// Every call fails as if GitHub could not be reached
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(method)
            .copied()
            .unwrap_or(0)
    }

    fn record(&self, method: &'static str) -> Result<(), GitHubError> {
        *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;
        if self.unreachable {
            return Err(GitHubError::Http("connection refused".to_string()));
        }
        Ok(())
    }

    fn check_repo(&self, repo: &str) -> Result<(), GitHubError> {
        if self.failing.contains(repo) {
            return Err(GitHubError::Upstream {
                status: 500,
                message: "Server Error".to_string(),
            });
        }
        if !self.repos.iter().any(|r| r.name.eq_ignore_ascii_case(repo)) {
            return Err(GitHubError::NotFound(format!("repos/{LOGIN}/{repo}")));
        }
        Ok(())
    }
}

#[async_trait]
impl GitHubApi for MockGitHub {
    async fn get_user(&self, username: &str) -> Result<GitHubUser, GitHubError> {
        self.record("get_user")?;
        if username.eq_ignore_ascii_case(LOGIN) {
            Ok(user())
        } else {
            Err(GitHubError::NotFound(format!("users/{username}")))
        }
    }

    async fn list_repos(&self, _username: &str) -> Result<Vec<GitHubRepo>, GitHubError> {
        self.record("list_repos")?;
        Ok(self.repos.clone())
    }

    async fn get_repo(&self, _owner: &str, repo: &str) -> Result<GitHubRepo, GitHubError> {
        self.record("get_repo")?;
        self.check_repo(repo)?;
        self.repos
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(repo))
            .cloned()
            .ok_or_else(|| GitHubError::NotFound(repo.to_string()))
    }

    async fn get_repo_languages(
        &self,
        _owner: &str,
        repo: &str,
    ) -> Result<LanguageBreakdown, GitHubError> {
        self.record("get_repo_languages")?;
        self.check_repo(repo)?;
        Ok(self.languages.get(repo).cloned().unwrap_or_default())
    }

    async fn list_commits(
        &self,
        _owner: &str,
        repo: &str,
        author: Option<&str>,
        since: Option<DateTime<Utc>>,
        max: usize,
    ) -> Result<Vec<GitHubCommit>, GitHubError> {
        self.record("list_commits")?;
        self.check_repo(repo)?;
        Ok(self
            .commits
            .get(repo)
            .map(|commits| {
                commits
                    .iter()
                    .filter(|c| {
                        author.is_none_or(|a| {
                            c.author.as_ref().is_some_and(|acc| acc.login == a)
                        })
                    })
                    .filter(|c| since.is_none_or(|s| c.commit.author.date >= s))
                    .take(max)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_contributors(
        &self,
        _owner: &str,
        repo: &str,
    ) -> Result<Vec<Contributor>, GitHubError> {
        self.record("list_contributors")?;
        self.check_repo(repo)?;
        Ok(vec![Contributor {
            login: LOGIN.to_string(),
            avatar_url: format!("https://avatars.example/{LOGIN}"),
            html_url: format!("https://github.com/{LOGIN}"),
            contributions: 12,
        }])
    }

    async fn get_readme(&self, _owner: &str, repo: &str) -> Result<Readme, GitHubError> {
        self.record("get_readme")?;
        self.check_repo(repo)?;
        Ok(Readme {
            repo: repo.to_string(),
            name: "README.md".to_string(),
            html_url: format!("https://github.com/{LOGIN}/{repo}/blob/main/README.md"),
            content: format!("# {repo}\n"),
        })
    }

    async fn list_events(&self, _username: &str) -> Result<Vec<GitHubEvent>, GitHubError> {
        self.record("list_events")?;
        Ok(self.events.clone())
    }

    async fn get_rate_limit(&self) -> Result<RateLimitStatus, GitHubError> {
        self.record("get_rate_limit")?;
        let remaining = self.rate_limit_remaining.unwrap_or(4990);
        Ok(RateLimitStatus {
            limit: 5000,
            remaining,
            used: 5000u32.saturating_sub(remaining),
            reset_at: Utc::now(),
        })
    }
}
