//! Portfolio models
//!
//! Types derived from GitHub data by the classification and metrics services.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Project category assigned by keyword classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectCategory {
    WebApp,
    Library,
    CliTool,
    DataScience,
    Mobile,
    Devops,
    Game,
    Documentation,
    Other,
}

impl fmt::Display for ProjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WebApp => "web-app",
            Self::Library => "library",
            Self::CliTool => "cli-tool",
            Self::DataScience => "data-science",
            Self::Mobile => "mobile",
            Self::Devops => "devops",
            Self::Game => "game",
            Self::Documentation => "documentation",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

impl FromStr for ProjectCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web-app" => Ok(Self::WebApp),
            "library" => Ok(Self::Library),
            "cli-tool" => Ok(Self::CliTool),
            "data-science" => Ok(Self::DataScience),
            "mobile" => Ok(Self::Mobile),
            "devops" => Ok(Self::Devops),
            "game" => Ok(Self::Game),
            "documentation" => Ok(Self::Documentation),
            "other" => Ok(Self::Other),
            _ => Err(format!(
                "Invalid category: {s}. Valid values are: web-app, library, cli-tool, \
                 data-science, mobile, devops, game, documentation, other"
            )),
        }
    }
}

/// Kind of technology in the detection catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechnologyKind {
    Language,
    Framework,
    Database,
    Cloud,
    Tooling,
}

/// A repository classified as a portfolio project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub homepage: Option<String>,
    pub category: ProjectCategory,
    pub primary_language: Option<String>,
    pub technologies: Vec<String>,
    pub topics: Vec<String>,
    pub stars: u32,
    pub forks: u32,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LanguageStat {
    pub language: String,
    pub bytes: u64,
    pub percentage: f64,
    pub repo_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyStat {
    pub name: String,
    pub kind: TechnologyKind,
    pub repo_count: u32,
    pub repos: Vec<String>,
}

/// Commit streaks over distinct UTC days
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreakStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub longest_streak_start: Option<NaiveDate>,
    pub longest_streak_end: Option<NaiveDate>,
    pub total_active_days: u32,
    pub last_active_day: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityStats {
    pub total_commits: u32,
    pub active_days: u32,
    pub average_per_active_day: f64,
    /// Monday first
    pub commits_by_weekday: [u32; 7],
    /// Hour of day, UTC
    pub commits_by_hour: Vec<u32>,
    pub most_productive_weekday: Option<String>,
    pub most_productive_hour: Option<u32>,
    pub commits_last_7_days: u32,
    pub commits_last_30_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    /// `YYYY-MM`
    pub period: String,
    pub repos_created: Vec<String>,
    pub commits: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: String,
    pub total_repos: u32,
    pub original_repos: u32,
    pub total_stars: u32,
    pub total_forks: u32,
    pub followers: u32,
    pub active_projects: u32,
    pub top_languages: Vec<String>,
    pub account_age_years: u32,
    pub generated_at: DateTime<Utc>,
}

/// Query parameters for `GET /v1/repos`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoListQuery {
    #[serde(default)]
    pub include_forks: Option<bool>,
    /// `stars`, `updated` or `name` (default: `updated`)
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Sort order for repository listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepoSort {
    Stars,
    #[default]
    Updated,
    Name,
}

impl FromStr for RepoSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stars" => Ok(Self::Stars),
            "updated" => Ok(Self::Updated),
            "name" => Ok(Self::Name),
            _ => Err(format!(
                "Invalid sort: {s}. Valid values are: stars, updated, name"
            )),
        }
    }
}

/// `?limit=` query shared by list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Query parameters for `GET /v1/projects`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectQuery {
    #[serde(default)]
    pub category: Option<String>,
}
