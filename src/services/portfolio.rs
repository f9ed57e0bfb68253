//! Portfolio Service
//!
//! One method per read endpoint. Raw GitHub data and every derived view
//! are cached under their own keys; derived views are built from the
//! cached raw data so a metrics miss does not refetch everything.
//!
//! Cache keys (all under the `gitfolio:{login}:` namespace):
//! - `profile`, `repos`, `events`, `commits`
//! - `repo:{name}:info|languages|contributors|readme|commits:{limit}`
//! - `projects`
//! - `metrics:{languages|technologies|streaks|productivity|timeline|summary}`

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures_util::{StreamExt, future, stream};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{CacheTtls, Config, MAX_COMMIT_LOOKBACK_DAYS};
use crate::models::{
    ActivityItem, CommitSummary, Contributor, GitHubRepo, GitHubUser, LanguageBreakdown,
    LanguageStat, PortfolioSummary, ProductivityStats, Project, ProjectCategory, RateLimitStatus,
    Readme, RepoListQuery, RepoSort, StreakStats, TechnologyStat, TimelineEntry,
};
use crate::services::cache::{CacheService, Cached};
use crate::services::classification;
use crate::services::github::{GitHubApi, GitHubError};
use crate::services::metrics;

/// Concurrent per-repository GitHub requests during fan-out
const FAN_OUT_CONCURRENCY: usize = 4;

/// Default number of commits for `/v1/repos/{name}/commits`
pub const DEFAULT_COMMIT_LIMIT: usize = 30;

/// Default number of events for `/v1/activity`
pub const DEFAULT_ACTIVITY_LIMIT: usize = 30;

/// Maximum `?limit=` for commit, activity and repository listings
pub const MAX_LIST_LIMIT: usize = 100;

/// Commits read per repository when building the commit history
const HISTORY_COMMITS_PER_REPO: usize = 1000;

const MAX_REPO_NAME_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error("Invalid request: {0}")]
    InvalidQuery(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),
}

/// Repository names as GitHub allows them: `[A-Za-z0-9._-]{1,100}`
pub fn validate_repo_name(name: &str) -> Result<(), PortfolioError> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if name.is_empty() || name.len() > MAX_REPO_NAME_LEN || !valid_chars {
        return Err(PortfolioError::InvalidQuery(format!(
            "Invalid repository name: {name}"
        )));
    }

    // Would be normalized away as path segments
    if name == "." || name == ".." {
        return Err(PortfolioError::InvalidQuery(format!(
            "Invalid repository name: {name}"
        )));
    }

    Ok(())
}

/// `repo:{name}:{suffix}`; GitHub repository names are case-insensitive
fn repo_key(name: &str, suffix: &str) -> String {
    format!("repo:{}:{suffix}", name.to_lowercase())
}

/// Apply `?limit=` with a default and an upper bound
pub fn clamp_limit(limit: Option<usize>, default: usize, max: usize) -> usize {
    limit.unwrap_or(default).clamp(1, max)
}

fn sort_repos(repos: &mut [GitHubRepo], sort: RepoSort) {
    match sort {
        RepoSort::Stars => repos.sort_by(|a, b| {
            b.stargazers_count
                .cmp(&a.stargazers_count)
                .then_with(|| a.name.cmp(&b.name))
        }),
        RepoSort::Updated => repos.sort_by(|a, b| {
            let a_at = a.pushed_at.unwrap_or(a.updated_at);
            let b_at = b.pushed_at.unwrap_or(b.updated_at);
            b_at.cmp(&a_at).then_with(|| a.name.cmp(&b.name))
        }),
        RepoSort::Name => repos.sort_by_key(|r| r.name.to_lowercase()),
    }
}

/// Portfolio reads for one configured GitHub account
#[derive(Clone)]
pub struct PortfolioService {
    github: Arc<dyn GitHubApi>,
    cache: CacheService,
    username: String,
    ttls: CacheTtls,
    commit_lookback: Duration,
}

impl PortfolioService {
    pub fn new(github: Arc<dyn GitHubApi>, cache: CacheService, config: &Config) -> Self {
        Self {
            github,
            cache,
            username: config.github_username.clone(),
            ttls: config.cache_ttls,
            commit_lookback: Duration::days(
                config
                    .commit_lookback_days
                    .clamp(1, MAX_COMMIT_LOOKBACK_DAYS),
            ),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    // ------------------------------------------------------------------------
    // Raw GitHub data
    // ------------------------------------------------------------------------

    pub async fn profile(&self) -> Result<Cached<GitHubUser>, PortfolioError> {
        Ok(self
            .cache
            .get_or_fetch("profile", self.ttls.profile, || {
                self.github.get_user(&self.username)
            })
            .await?)
    }

    async fn all_repos(&self) -> Result<Cached<Vec<GitHubRepo>>, PortfolioError> {
        Ok(self
            .cache
            .get_or_fetch("repos", self.ttls.repos, || {
                self.github.list_repos(&self.username)
            })
            .await?)
    }

    /// Owned repositories, filtered and sorted per the query
    pub async fn repos(
        &self,
        query: &RepoListQuery,
    ) -> Result<Cached<Vec<GitHubRepo>>, PortfolioError> {
        let sort = query
            .sort
            .as_deref()
            .map(str::parse::<RepoSort>)
            .transpose()
            .map_err(PortfolioError::InvalidQuery)?
            .unwrap_or_default();
        let include_forks = query.include_forks.unwrap_or(false);
        let limit = query.limit.map(|l| l.clamp(1, MAX_LIST_LIMIT));

        let cached = self.all_repos().await?;

        Ok(cached.map(|repos| {
            let mut repos: Vec<GitHubRepo> = repos
                .into_iter()
                .filter(|r| include_forks || !r.fork)
                .collect();
            sort_repos(&mut repos, sort);
            if let Some(limit) = limit {
                repos.truncate(limit);
            }
            repos
        }))
    }

    pub async fn repo(&self, name: &str) -> Result<Cached<GitHubRepo>, PortfolioError> {
        validate_repo_name(name)?;
        Ok(self
            .cache
            .get_or_fetch(&repo_key(name, "info"), self.ttls.repos, || {
                self.github.get_repo(&self.username, name)
            })
            .await?)
    }

    pub async fn repo_languages(
        &self,
        name: &str,
    ) -> Result<Cached<LanguageBreakdown>, PortfolioError> {
        validate_repo_name(name)?;
        Ok(self
            .cache
            .get_or_fetch(&repo_key(name, "languages"), self.ttls.repos, || {
                self.github.get_repo_languages(&self.username, name)
            })
            .await?)
    }

    pub async fn repo_commits(
        &self,
        name: &str,
        limit: Option<usize>,
    ) -> Result<Cached<Vec<CommitSummary>>, PortfolioError> {
        validate_repo_name(name)?;
        let limit = clamp_limit(limit, DEFAULT_COMMIT_LIMIT, MAX_LIST_LIMIT);

        Ok(self
            .cache
            .get_or_fetch(
                &repo_key(name, &format!("commits:{limit}")),
                self.ttls.activity,
                || async {
                    let commits = self
                        .github
                        .list_commits(&self.username, name, None, None, limit)
                        .await?;
                    Ok::<_, GitHubError>(
                        commits
                            .into_iter()
                            .map(|c| CommitSummary::from_commit(name, c))
                            .collect(),
                    )
                },
            )
            .await?)
    }

    pub async fn repo_contributors(
        &self,
        name: &str,
    ) -> Result<Cached<Vec<Contributor>>, PortfolioError> {
        validate_repo_name(name)?;
        Ok(self
            .cache
            .get_or_fetch(&repo_key(name, "contributors"), self.ttls.repos, || {
                self.github.list_contributors(&self.username, name)
            })
            .await?)
    }

    pub async fn repo_readme(&self, name: &str) -> Result<Cached<Readme>, PortfolioError> {
        validate_repo_name(name)?;
        Ok(self
            .cache
            .get_or_fetch(&repo_key(name, "readme"), self.ttls.repos, || {
                self.github.get_readme(&self.username, name)
            })
            .await?)
    }

    /// Recent public events, newest first
    pub async fn activity(
        &self,
        limit: Option<usize>,
    ) -> Result<Cached<Vec<ActivityItem>>, PortfolioError> {
        let limit = clamp_limit(limit, DEFAULT_ACTIVITY_LIMIT, MAX_LIST_LIMIT);

        let cached = self
            .cache
            .get_or_fetch("events", self.ttls.activity, || async {
                let events = self.github.list_events(&self.username).await?;
                Ok::<_, GitHubError>(
                    events
                        .into_iter()
                        .map(ActivityItem::from_event)
                        .collect::<Vec<_>>(),
                )
            })
            .await?;

        Ok(cached.map(|mut items| {
            items.truncate(limit);
            items
        }))
    }

    /// Never cached
    pub async fn rate_limit(&self) -> Result<RateLimitStatus, PortfolioError> {
        Ok(self.github.get_rate_limit().await?)
    }

    // ------------------------------------------------------------------------
    // Fan-out over repositories
    // ------------------------------------------------------------------------

    /// Language breakdowns of every non-fork repository, keyed by name.
    /// Repositories whose languages cannot be fetched are skipped.
    async fn language_breakdowns(
        &self,
        repos: &[GitHubRepo],
    ) -> HashMap<String, LanguageBreakdown> {
        stream::iter(repos.iter().filter(|r| !r.fork))
            .map(|repo| async move {
                match self.repo_languages(&repo.name).await {
                    Ok(cached) => Some((repo.name.clone(), cached.value)),
                    Err(e) => {
                        warn!(repo = %repo.name, error = %e, "Skipping repository languages");
                        None
                    }
                }
            })
            .buffer_unordered(FAN_OUT_CONCURRENCY)
            .filter_map(future::ready)
            .collect()
            .await
    }

    /// Timestamps of the user's commits across original, unarchived
    /// repositories within the lookback window
    async fn commit_history(&self) -> Result<Vec<DateTime<Utc>>, PortfolioError> {
        let repos = self.all_repos().await?.value;
        let since = Utc::now() - self.commit_lookback;

        let cached = self
            .cache
            .get_or_fetch("commits", self.ttls.activity, || async {
                let targets: Vec<&GitHubRepo> = repos
                    .iter()
                    .filter(|r| !r.fork && !r.archived)
                    .collect();

                debug!(repos = targets.len(), "Collecting commit history");

                let mut dates: Vec<DateTime<Utc>> = stream::iter(targets)
                    .map(|repo| async move {
                        match self
                            .github
                            .list_commits(
                                &self.username,
                                &repo.name,
                                Some(self.username.as_str()),
                                Some(since),
                                HISTORY_COMMITS_PER_REPO,
                            )
                            .await
                        {
                            Ok(commits) => commits
                                .into_iter()
                                .map(|c| c.commit.author.date)
                                .collect::<Vec<_>>(),
                            Err(e) => {
                                warn!(repo = %repo.name, error = %e, "Skipping repository commits");
                                Vec::new()
                            }
                        }
                    })
                    .buffer_unordered(FAN_OUT_CONCURRENCY)
                    .flat_map(stream::iter)
                    .collect()
                    .await;

                dates.sort();
                Ok::<_, PortfolioError>(dates)
            })
            .await?;

        Ok(cached.value)
    }

    // ------------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------------

    async fn all_projects(&self) -> Result<Cached<Vec<Project>>, PortfolioError> {
        self.cache
            .get_or_fetch("projects", self.ttls.metrics, || async {
                let repos = self.all_repos().await?.value;
                let languages = self.language_breakdowns(&repos).await;
                let projects = classification::select_projects(&repos, &languages, Utc::now());
                info!(projects = projects.len(), "Classified repositories");
                Ok::<_, PortfolioError>(projects)
            })
            .await
    }

    /// Classified projects, best first, optionally of one category
    pub async fn projects(
        &self,
        category: Option<&str>,
    ) -> Result<Cached<Vec<Project>>, PortfolioError> {
        let category = category
            .map(str::parse::<ProjectCategory>)
            .transpose()
            .map_err(PortfolioError::InvalidQuery)?;

        let cached = self.all_projects().await?;
        Ok(cached.map(|projects| match category {
            Some(category) => projects
                .into_iter()
                .filter(|p| p.category == category)
                .collect(),
            None => projects,
        }))
    }

    pub async fn featured_projects(
        &self,
        limit: Option<usize>,
    ) -> Result<Cached<Vec<Project>>, PortfolioError> {
        let cached = self.all_projects().await?;
        Ok(cached.map(|projects| classification::featured_projects(&projects, limit)))
    }

    pub async fn project(&self, name: &str) -> Result<Cached<Project>, PortfolioError> {
        validate_repo_name(name)?;

        let cached = self.all_projects().await?;
        let status = cached.status;
        cached
            .value
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|value| Cached { value, status })
            .ok_or_else(|| PortfolioError::ProjectNotFound(name.to_string()))
    }

    // ------------------------------------------------------------------------
    // Metrics
    // ------------------------------------------------------------------------

    pub async fn language_metrics(&self) -> Result<Cached<Vec<LanguageStat>>, PortfolioError> {
        self.cache
            .get_or_fetch("metrics:languages", self.ttls.metrics, || async {
                let repos = self.all_repos().await?.value;
                let breakdowns = self.language_breakdowns(&repos).await;
                Ok::<_, PortfolioError>(metrics::language_stats(breakdowns.values()))
            })
            .await
    }

    pub async fn technology_metrics(
        &self,
    ) -> Result<Cached<Vec<TechnologyStat>>, PortfolioError> {
        self.cache
            .get_or_fetch("metrics:technologies", self.ttls.metrics, || async {
                let projects = self.all_projects().await?.value;
                Ok::<_, PortfolioError>(metrics::technology_stats(&projects))
            })
            .await
    }

    pub async fn streaks(&self) -> Result<Cached<StreakStats>, PortfolioError> {
        self.cache
            .get_or_fetch("metrics:streaks", self.ttls.metrics, || async {
                let history = self.commit_history().await?;
                Ok::<_, PortfolioError>(metrics::streak_stats(&history, Utc::now().date_naive()))
            })
            .await
    }

    pub async fn productivity(&self) -> Result<Cached<ProductivityStats>, PortfolioError> {
        self.cache
            .get_or_fetch("metrics:productivity", self.ttls.metrics, || async {
                let history = self.commit_history().await?;
                Ok::<_, PortfolioError>(metrics::productivity_stats(&history, Utc::now()))
            })
            .await
    }

    pub async fn timeline(&self) -> Result<Cached<Vec<TimelineEntry>>, PortfolioError> {
        self.cache
            .get_or_fetch("metrics:timeline", self.ttls.metrics, || async {
                let repos = self.all_repos().await?.value;
                let history = self.commit_history().await?;
                Ok::<_, PortfolioError>(metrics::timeline(&repos, &history))
            })
            .await
    }

    pub async fn summary(&self) -> Result<Cached<PortfolioSummary>, PortfolioError> {
        self.cache
            .get_or_fetch("metrics:summary", self.ttls.metrics, || async {
                let user = self.profile().await?.value;
                let repos = self.all_repos().await?.value;
                let languages = self.language_metrics().await?.value;
                let projects = self.all_projects().await?.value;
                Ok::<_, PortfolioError>(metrics::portfolio_summary(
                    &user,
                    &repos,
                    &languages,
                    &projects,
                    Utc::now(),
                ))
            })
            .await
    }
}
