use std::env;
use std::time::Duration;

const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Upper bound for `COMMIT_LOOKBACK_DAYS` (ten years)
pub const MAX_COMMIT_LOOKBACK_DAYS: i64 = 3650;

/// Cache lifetimes per data category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// User profile (default: 1 hour)
    pub profile: Duration,
    /// Repository listings, languages, contributors, readmes (default: 30 minutes)
    pub repos: Duration,
    /// Commits and public events (default: 5 minutes)
    pub activity: Duration,
    /// Derived metrics and projects (default: 30 minutes)
    pub metrics: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            profile: Duration::from_secs(3600),
            repos: Duration::from_secs(1800),
            activity: Duration::from_secs(300),
            metrics: Duration::from_secs(1800),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// GitHub account whose portfolio is served
    pub github_username: String,
    /// Optional personal access token (raises the rate limit from 60 to 5000/h)
    pub github_token: Option<String>,
    /// GitHub REST API base URL
    pub github_api_url: String,
    /// Redis connection URL; the in-memory cache is used when unset
    pub redis_url: Option<String>,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Upstream request timeout in seconds
    pub request_timeout_secs: u64,
    /// How far back commit history is read for streaks and productivity
    pub commit_lookback_days: i64,
    /// Cache lifetimes
    pub cache_ttls: CacheTtls,
    /// Entry cap for the in-memory cache
    pub memory_cache_max_entries: usize,
    /// Shared secret for GitHub webhook signatures
    pub webhook_secret: Option<String>,
    /// Bearer token required to clear the cache
    pub cache_admin_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let github_username = env::var("GITHUB_USERNAME")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar("GITHUB_USERNAME"))?;

        let github_api_url = env::var("GITHUB_API_URL")
            .unwrap_or_else(|_| DEFAULT_GITHUB_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_var("PORT", 8080)?;
        let request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", 10)?;
        let commit_lookback_days: i64 = parse_var("COMMIT_LOOKBACK_DAYS", 365)?;
        if !(1..=MAX_COMMIT_LOOKBACK_DAYS).contains(&commit_lookback_days) {
            return Err(ConfigError::InvalidValue("COMMIT_LOOKBACK_DAYS"));
        }
        let memory_cache_max_entries = parse_var("MEMORY_CACHE_MAX_ENTRIES", 1000)?;

        let defaults = CacheTtls::default();
        let cache_ttls = CacheTtls {
            profile: Duration::from_secs(parse_var(
                "PROFILE_TTL_SECS",
                defaults.profile.as_secs(),
            )?),
            repos: Duration::from_secs(parse_var("REPOS_TTL_SECS", defaults.repos.as_secs())?),
            activity: Duration::from_secs(parse_var(
                "ACTIVITY_TTL_SECS",
                defaults.activity.as_secs(),
            )?),
            metrics: Duration::from_secs(parse_var(
                "METRICS_TTL_SECS",
                defaults.metrics.as_secs(),
            )?),
        };

        Ok(Self {
            github_username: github_username.trim().to_string(),
            github_token: optional_var("GITHUB_TOKEN"),
            github_api_url,
            redis_url: optional_var("REDIS_URL"),
            host,
            port,
            request_timeout_secs,
            commit_lookback_days,
            cache_ttls,
            memory_cache_max_entries,
            webhook_secret: optional_var("WEBHOOK_SECRET"),
            cache_admin_token: optional_var("CACHE_ADMIN_TOKEN"),
        })
    }

    /// Configuration with defaults for the given account (useful for testing)
    pub fn for_user(github_username: impl Into<String>) -> Self {
        Self {
            github_username: github_username.into(),
            github_token: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            redis_url: None,
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 10,
            commit_lookback_days: 365,
            cache_ttls: CacheTtls::default(),
            memory_cache_max_entries: 1000,
            webhook_secret: None,
            cache_admin_token: None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Read an optional variable, treating empty values as unset
fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key)),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
