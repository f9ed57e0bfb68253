//! Portfolio Metrics
//!
//! Aggregations over GitHub data: language shares, technology usage,
//! commit streaks, productivity histograms and a monthly timeline.
//! All functions are pure; the caller supplies the clock.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use tracing::debug;

use crate::models::{
    GitHubRepo, GitHubUser, LanguageBreakdown, LanguageStat, PortfolioSummary,
    ProductivityStats, Project, StreakStats, TechnologyStat, TimelineEntry,
};
use crate::services::classification::technology_kind;

/// Number of languages listed in the portfolio summary
const SUMMARY_TOP_LANGUAGES: usize = 3;

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Round to one decimal place
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Index of the largest bucket, earliest index on ties; `None` when all are zero
fn argmax(buckets: &[u32]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &count) in buckets.iter().enumerate() {
        if count == 0 {
            continue;
        }
        match best {
            Some(b) if buckets[b] >= count => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Byte totals and repository counts per language across repositories
pub fn language_stats<'a>(
    breakdowns: impl IntoIterator<Item = &'a LanguageBreakdown>,
) -> Vec<LanguageStat> {
    let mut totals: HashMap<&'a str, (u64, u32)> = HashMap::new();

    for breakdown in breakdowns {
        for (language, bytes) in breakdown {
            let entry = totals.entry(language.as_str()).or_insert((0, 0));
            entry.0 += bytes;
            entry.1 += 1;
        }
    }

    let total_bytes: u64 = totals.values().map(|(bytes, _)| bytes).sum();

    let mut stats: Vec<LanguageStat> = totals
        .into_iter()
        .map(|(language, (bytes, repo_count))| LanguageStat {
            language: language.to_string(),
            bytes,
            percentage: if total_bytes == 0 {
                0.0
            } else {
                round1(bytes as f64 * 100.0 / total_bytes as f64)
            },
            repo_count,
        })
        .collect();

    stats.sort_by(|a, b| {
        b.bytes
            .cmp(&a.bytes)
            .then_with(|| a.language.cmp(&b.language))
    });

    debug!(languages = stats.len(), total_bytes, "Computed language stats");
    stats
}

/// Repositories using each detected technology
pub fn technology_stats(projects: &[Project]) -> Vec<TechnologyStat> {
    let mut usage: HashMap<&str, BTreeSet<&str>> = HashMap::new();

    for project in projects {
        for technology in &project.technologies {
            usage
                .entry(technology.as_str())
                .or_default()
                .insert(project.name.as_str());
        }
    }

    let mut stats: Vec<TechnologyStat> = usage
        .into_iter()
        .map(|(name, repos)| TechnologyStat {
            name: name.to_string(),
            kind: technology_kind(name),
            repo_count: repos.len() as u32,
            repos: repos.into_iter().map(str::to_string).collect(),
        })
        .collect();

    stats.sort_by(|a, b| {
        b.repo_count
            .cmp(&a.repo_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    stats
}

/// Streaks over the distinct UTC days that have at least one commit
pub fn streak_stats(commit_dates: &[DateTime<Utc>], today: NaiveDate) -> StreakStats {
    let days: BTreeSet<NaiveDate> = commit_dates.iter().map(|d| d.date_naive()).collect();

    let Some(&last_active_day) = days.last() else {
        return StreakStats::default();
    };

    // Longest run; a later run must be strictly longer to replace an earlier one
    let mut longest = (0u32, None::<NaiveDate>, None::<NaiveDate>);
    let mut run_start: Option<NaiveDate> = None;
    let mut run_len = 0u32;
    let mut prev: Option<NaiveDate> = None;

    for &day in &days {
        let continues = prev.and_then(|p| p.succ_opt()) == Some(day);
        if continues {
            run_len += 1;
        } else {
            run_start = Some(day);
            run_len = 1;
        }
        if run_len > longest.0 {
            longest = (run_len, run_start, Some(day));
        }
        prev = Some(day);
    }

    // Current streak ends today, or yesterday when today has no commit yet
    let anchor = if days.contains(&today) {
        Some(today)
    } else {
        today.pred_opt().filter(|yesterday| days.contains(yesterday))
    };

    let mut current_streak = 0u32;
    let mut cursor = anchor;
    while let Some(day) = cursor.filter(|d| days.contains(d)) {
        current_streak += 1;
        cursor = day.pred_opt();
    }

    StreakStats {
        current_streak,
        longest_streak: longest.0,
        longest_streak_start: longest.1,
        longest_streak_end: longest.2,
        total_active_days: days.len() as u32,
        last_active_day: Some(last_active_day),
    }
}

/// Weekday and hour histograms plus recent commit counts
pub fn productivity_stats(commit_dates: &[DateTime<Utc>], now: DateTime<Utc>) -> ProductivityStats {
    let mut by_weekday = [0u32; 7];
    let mut by_hour = vec![0u32; 24];
    let mut days = BTreeSet::new();
    let mut last_7_days = 0u32;
    let mut last_30_days = 0u32;

    for date in commit_dates {
        by_weekday[date.weekday().num_days_from_monday() as usize] += 1;
        by_hour[date.hour() as usize] += 1;
        days.insert(date.date_naive());

        if *date <= now {
            let age = now - *date;
            if age < Duration::days(7) {
                last_7_days += 1;
            }
            if age < Duration::days(30) {
                last_30_days += 1;
            }
        }
    }

    let total_commits = commit_dates.len() as u32;
    let active_days = days.len() as u32;
    let average_per_active_day = if active_days == 0 {
        0.0
    } else {
        round1(total_commits as f64 / active_days as f64)
    };

    ProductivityStats {
        total_commits,
        active_days,
        average_per_active_day,
        commits_by_weekday: by_weekday,
        most_productive_weekday: argmax(&by_weekday).map(|i| WEEKDAY_NAMES[i].to_string()),
        most_productive_hour: argmax(&by_hour).map(|i| i as u32),
        commits_by_hour: by_hour,
        commits_last_7_days: last_7_days,
        commits_last_30_days: last_30_days,
    }
}

/// Monthly buckets of created repositories and commit counts, oldest first
pub fn timeline(repos: &[GitHubRepo], commit_dates: &[DateTime<Utc>]) -> Vec<TimelineEntry> {
    let mut months: BTreeMap<String, (Vec<(DateTime<Utc>, String)>, u32)> = BTreeMap::new();

    for repo in repos.iter().filter(|r| !r.fork) {
        months
            .entry(repo.created_at.format("%Y-%m").to_string())
            .or_default()
            .0
            .push((repo.created_at, repo.name.clone()));
    }

    for date in commit_dates {
        months
            .entry(date.format("%Y-%m").to_string())
            .or_default()
            .1 += 1;
    }

    months
        .into_iter()
        .map(|(period, (mut created, commits))| {
            created.sort();
            TimelineEntry {
                period,
                repos_created: created.into_iter().map(|(_, name)| name).collect(),
                commits,
            }
        })
        .collect()
}

/// Headline numbers for the portfolio landing page
pub fn portfolio_summary(
    user: &GitHubUser,
    repos: &[GitHubRepo],
    languages: &[LanguageStat],
    projects: &[Project],
    now: DateTime<Utc>,
) -> PortfolioSummary {
    let originals: Vec<&GitHubRepo> = repos.iter().filter(|r| !r.fork).collect();

    PortfolioSummary {
        login: user.login.clone(),
        name: user.name.clone(),
        avatar_url: user.avatar_url.clone(),
        total_repos: repos.len() as u32,
        original_repos: originals.len() as u32,
        total_stars: originals.iter().map(|r| r.stargazers_count).sum(),
        total_forks: originals.iter().map(|r| r.forks_count).sum(),
        followers: user.followers,
        active_projects: projects.iter().filter(|p| p.is_active).count() as u32,
        top_languages: languages
            .iter()
            .take(SUMMARY_TOP_LANGUAGES)
            .map(|l| l.language.clone())
            .collect(),
        account_age_years: now
            .date_naive()
            .years_since(user.created_at.date_naive())
            .unwrap_or(0),
        generated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TechnologyKind;
    use crate::services::classification::tests::now;
    use crate::services::mock_github::{repo, user};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn project(name: &str, technologies: &[&str], active: bool) -> Project {
        let r = repo(name);
        let mut p = crate::services::classification::classify_repository(
            &r,
            &LanguageBreakdown::new(),
            now(),
        );
        p.technologies = technologies.iter().map(|t| t.to_string()).collect();
        p.is_active = active;
        p
    }

    #[test]
    fn test_language_stats_empty() {
        assert!(language_stats(&[] as &[LanguageBreakdown]).is_empty());
    }

    #[test]
    fn test_language_stats_aggregates_and_sorts() {
        let breakdowns = [
            LanguageBreakdown::from([("Rust".to_string(), 600), ("Shell".to_string(), 100)]),
            LanguageBreakdown::from([("Go".to_string(), 100), ("Rust".to_string(), 200)]),
        ];

        let stats = language_stats(&breakdowns);
        let names: Vec<&str> = stats.iter().map(|s| s.language.as_str()).collect();
        // Go and Shell tie on bytes and sort by name
        assert_eq!(names, vec!["Rust", "Go", "Shell"]);

        assert_eq!(stats[0].bytes, 800);
        assert_eq!(stats[0].repo_count, 2);
        assert_eq!(stats[0].percentage, 80.0);
        assert_eq!(stats[1].percentage, 10.0);
    }

    #[test]
    fn test_language_stats_rounds_to_one_decimal() {
        let breakdowns = [LanguageBreakdown::from([
            ("A".to_string(), 1),
            ("B".to_string(), 2),
        ])];
        let stats = language_stats(&breakdowns);
        assert_eq!(stats[0].percentage, 66.7);
        assert_eq!(stats[1].percentage, 33.3);
    }

    #[test]
    fn test_technology_stats() {
        let projects = [
            project("api", &["Rust", "PostgreSQL"], true),
            project("cli", &["Rust"], true),
            project("site", &["TypeScript", "PostgreSQL"], false),
        ];

        let stats = technology_stats(&projects);
        let names: Vec<&str> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["PostgreSQL", "Rust", "TypeScript"]);
        assert_eq!(stats[0].repos, vec!["api", "site"]);
        assert_eq!(stats[0].kind, TechnologyKind::Database);
        assert_eq!(stats[1].kind, TechnologyKind::Language);
    }

    #[test]
    fn test_streak_no_commits() {
        assert_eq!(streak_stats(&[], day(2024, 6, 1)), StreakStats::default());
    }

    #[test]
    fn test_streak_current_ending_today() {
        let dates = [
            at(2024, 5, 30, 9),
            at(2024, 5, 31, 23),
            at(2024, 6, 1, 1),
            at(2024, 6, 1, 5),
        ];
        let stats = streak_stats(&dates, day(2024, 6, 1));
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.total_active_days, 3);
        assert_eq!(stats.last_active_day, Some(day(2024, 6, 1)));
    }

    #[test]
    fn test_streak_current_ending_yesterday() {
        let dates = [at(2024, 5, 30, 9), at(2024, 5, 31, 9)];
        let stats = streak_stats(&dates, day(2024, 6, 1));
        assert_eq!(stats.current_streak, 2);
    }

    #[test]
    fn test_streak_broken() {
        let dates = [at(2024, 5, 29, 9), at(2024, 5, 30, 9)];
        let stats = streak_stats(&dates, day(2024, 6, 1));
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.longest_streak, 2);
    }

    #[test]
    fn test_longest_streak_earliest_wins_ties() {
        let dates = [
            at(2024, 1, 1, 9),
            at(2024, 1, 2, 9),
            at(2024, 3, 1, 9),
            at(2024, 3, 2, 9),
            at(2024, 4, 10, 9),
        ];
        let stats = streak_stats(&dates, day(2024, 6, 1));
        assert_eq!(stats.longest_streak, 2);
        assert_eq!(stats.longest_streak_start, Some(day(2024, 1, 1)));
        assert_eq!(stats.longest_streak_end, Some(day(2024, 1, 2)));
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let dates = [at(2024, 2, 28, 9), at(2024, 2, 29, 9), at(2024, 3, 1, 9)];
        let stats = streak_stats(&dates, day(2024, 3, 1));
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);
    }

    #[test]
    fn test_productivity_stats() {
        let now = at(2024, 6, 1, 12);
        let dates = [
            // 2024-05-27 is a Monday
            at(2024, 5, 27, 9),
            at(2024, 5, 27, 14),
            at(2024, 5, 28, 9),
            at(2024, 4, 1, 9),
        ];

        let stats = productivity_stats(&dates, now);
        assert_eq!(stats.total_commits, 4);
        assert_eq!(stats.active_days, 3);
        assert_eq!(stats.average_per_active_day, 1.3);
        assert_eq!(stats.commits_by_weekday[0], 3);
        assert_eq!(stats.commits_by_weekday[1], 1);
        assert_eq!(stats.commits_by_hour[9], 3);
        assert_eq!(stats.commits_by_hour.len(), 24);
        assert_eq!(stats.most_productive_weekday.as_deref(), Some("Monday"));
        assert_eq!(stats.most_productive_hour, Some(9));
        assert_eq!(stats.commits_last_7_days, 3);
        assert_eq!(stats.commits_last_30_days, 3);
    }

    #[test]
    fn test_productivity_ties_pick_earliest() {
        // Wednesday 10:00 and Tuesday 15:00
        let dates = [at(2024, 5, 29, 10), at(2024, 5, 28, 15)];
        let stats = productivity_stats(&dates, at(2024, 6, 1, 0));
        assert_eq!(stats.most_productive_weekday.as_deref(), Some("Tuesday"));
        assert_eq!(stats.most_productive_hour, Some(10));
    }

    #[test]
    fn test_productivity_empty() {
        let stats = productivity_stats(&[], now());
        assert_eq!(stats.total_commits, 0);
        assert_eq!(stats.average_per_active_day, 0.0);
        assert!(stats.most_productive_weekday.is_none());
        assert!(stats.most_productive_hour.is_none());
    }

    #[test]
    fn test_timeline() {
        let mut a = repo("alpha");
        a.created_at = at(2024, 1, 20, 0);
        let mut b = repo("beta");
        b.created_at = at(2024, 1, 5, 0);
        let mut fork = repo("forked");
        fork.fork = true;
        fork.created_at = at(2024, 2, 1, 0);

        let commits = [at(2024, 1, 21, 0), at(2024, 3, 2, 0), at(2024, 3, 3, 0)];

        let entries = timeline(&[a, b, fork], &commits);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].period, "2024-01");
        assert_eq!(entries[0].repos_created, vec!["beta", "alpha"]);
        assert_eq!(entries[0].commits, 1);
        assert_eq!(entries[1].period, "2024-03");
        assert!(entries[1].repos_created.is_empty());
        assert_eq!(entries[1].commits, 2);
    }

    #[test]
    fn test_portfolio_summary() {
        let user: GitHubUser = serde_json::from_value(serde_json::json!({
            "login": "octocat",
            "id": 1,
            "name": "The Octocat",
            "avatar_url": "https://avatars.example/octocat",
            "html_url": "https://github.com/octocat",
            "followers": 42,
            "created_at": "2020-06-02T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        let mut a = repo("a");
        a.stargazers_count = 3;
        a.forks_count = 1;
        let mut fork = repo("b");
        fork.fork = true;
        fork.stargazers_count = 100;

        let languages = language_stats(&[LanguageBreakdown::from([
            ("Rust".to_string(), 10),
            ("Go".to_string(), 5),
        ])]);
        let projects = [project("a", &[], true)];

        let summary = portfolio_summary(&user, &[a, fork], &languages, &projects, now());
        assert_eq!(summary.total_repos, 2);
        assert_eq!(summary.original_repos, 1);
        assert_eq!(summary.total_stars, 3);
        assert_eq!(summary.total_forks, 1);
        assert_eq!(summary.followers, 42);
        assert_eq!(summary.active_projects, 1);
        assert_eq!(summary.top_languages, vec!["Rust", "Go"]);
        // 2020-06-02 to 2024-06-01 is three full years
        assert_eq!(summary.account_age_years, 3);
    }

    #[test]
    fn test_portfolio_summary_lists_three_top_languages() {
        let user = user();
        let languages = language_stats(&[LanguageBreakdown::from([
            ("Rust".to_string(), 500),
            ("Go".to_string(), 400),
            ("Python".to_string(), 300),
            ("Shell".to_string(), 200),
            ("HTML".to_string(), 100),
        ])]);

        let summary = portfolio_summary(&user, &[], &languages, &[], now());
        assert_eq!(summary.top_languages, vec!["Rust", "Go", "Python"]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn streak_invariants(offsets in proptest::collection::vec(0i64..60, 0..40)) {
            let base = at(2024, 1, 1, 12);
            let dates: Vec<DateTime<Utc>> =
                offsets.iter().map(|o| base + Duration::days(*o)).collect();
            let today = day(2024, 3, 1);

            let stats = streak_stats(&dates, today);

            prop_assert!(stats.current_streak <= stats.longest_streak);
            prop_assert!(stats.total_active_days >= stats.longest_streak);

            if let (Some(start), Some(end)) = (stats.longest_streak_start, stats.longest_streak_end) {
                prop_assert_eq!((end - start).num_days() + 1, stats.longest_streak as i64);
            } else {
                prop_assert_eq!(stats.longest_streak, 0);
            }
        }

        #[test]
        fn language_percentages_sum_to_100(
            sizes in proptest::collection::vec(1u64..1_000_000, 1..12)
        ) {
            let breakdown: LanguageBreakdown = sizes
                .iter()
                .enumerate()
                .map(|(i, bytes)| (format!("lang-{i}"), *bytes))
                .collect();

            let stats = language_stats([&breakdown]);
            let total: f64 = stats.iter().map(|s| s.percentage).sum();

            // each entry rounds by at most 0.05
            prop_assert!((total - 100.0).abs() <= 0.05 * stats.len() as f64 + 1e-9);
        }
    }
}
