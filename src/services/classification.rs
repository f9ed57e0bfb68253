//! Project Classification
//!
//! Turns raw repositories into portfolio projects: a category from keyword
//! rules, detected technologies, an activity flag and a ranking score.
//! Everything here is pure; the caller supplies `now`.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};

use crate::models::{GitHubRepo, LanguageBreakdown, Project, ProjectCategory, TechnologyKind};

/// Repositories pushed within this many days count as active
const ACTIVE_WINDOW_DAYS: i64 = 90;

/// Default number of featured projects
pub const DEFAULT_FEATURED_LIMIT: usize = 6;

/// Maximum number of featured projects
pub const MAX_FEATURED_LIMIT: usize = 20;

/// Recency bonus tiers: (max age in days, bonus points)
const RECENCY_BONUS: [(i64, u32); 3] = [(30, 10), (90, 5), (365, 2)];

/// Keyword rules in evaluation order; the first category with a match wins
const CATEGORY_RULES: &[(ProjectCategory, &[&str])] = &[
    (
        ProjectCategory::Documentation,
        &[
            "docs",
            "documentation",
            "tutorial",
            "tutorials",
            "guide",
            "handbook",
            "cheatsheet",
            "awesome",
            "notes",
            "book",
        ],
    ),
    (
        ProjectCategory::Game,
        &[
            "game", "games", "gamedev", "unity", "godot", "bevy", "pygame", "phaser", "puzzle",
        ],
    ),
    (
        ProjectCategory::Mobile,
        &[
            "android",
            "ios",
            "mobile",
            "flutter",
            "reactnative",
            "swiftui",
            "jetpackcompose",
        ],
    ),
    (
        ProjectCategory::DataScience,
        &[
            "datascience",
            "machinelearning",
            "deeplearning",
            "ml",
            "ai",
            "nlp",
            "llm",
            "jupyter",
            "notebook",
            "pandas",
            "numpy",
            "tensorflow",
            "pytorch",
            "analytics",
        ],
    ),
    (
        ProjectCategory::Devops,
        &[
            "devops",
            "docker",
            "kubernetes",
            "k8s",
            "terraform",
            "ansible",
            "helm",
            "cicd",
            "infrastructure",
            "dotfiles",
        ],
    ),
    (
        ProjectCategory::CliTool,
        &["cli", "terminal", "commandline", "tui", "console"],
    ),
    (
        ProjectCategory::WebApp,
        &[
            "web",
            "website",
            "webapp",
            "frontend",
            "backend",
            "fullstack",
            "api",
            "dashboard",
            "react",
            "vue",
            "angular",
            "svelte",
            "nextjs",
            "django",
            "flask",
            "express",
            "rails",
        ],
    ),
    (
        ProjectCategory::Library,
        &[
            "library", "lib", "sdk", "framework", "package", "crate", "plugin", "toolkit",
        ],
    ),
];

/// Primary-language fallback when no keyword matched
const LANGUAGE_FALLBACK: &[(&str, ProjectCategory)] = &[
    ("JavaScript", ProjectCategory::WebApp),
    ("TypeScript", ProjectCategory::WebApp),
    ("HTML", ProjectCategory::WebApp),
    ("CSS", ProjectCategory::WebApp),
    ("Vue", ProjectCategory::WebApp),
    ("Jupyter Notebook", ProjectCategory::DataScience),
    ("R", ProjectCategory::DataScience),
    ("Dockerfile", ProjectCategory::Devops),
    ("HCL", ProjectCategory::Devops),
    ("Shell", ProjectCategory::Devops),
    ("Swift", ProjectCategory::Mobile),
    ("Kotlin", ProjectCategory::Mobile),
    ("Dart", ProjectCategory::Mobile),
    ("Objective-C", ProjectCategory::Mobile),
];

/// A technology recognised from repository keywords
struct CatalogEntry {
    name: &'static str,
    kind: TechnologyKind,
    aliases: &'static [&'static str],
}

const fn tech(
    name: &'static str,
    kind: TechnologyKind,
    aliases: &'static [&'static str],
) -> CatalogEntry {
    CatalogEntry {
        name,
        kind,
        aliases,
    }
}

const TECHNOLOGY_CATALOG: &[CatalogEntry] = &[
    tech("React", TechnologyKind::Framework, &["react", "reactjs"]),
    tech("Vue", TechnologyKind::Framework, &["vue", "vuejs"]),
    tech("Angular", TechnologyKind::Framework, &["angular"]),
    tech("Svelte", TechnologyKind::Framework, &["svelte", "sveltekit"]),
    tech("Next.js", TechnologyKind::Framework, &["nextjs"]),
    tech("Node.js", TechnologyKind::Framework, &["nodejs", "node"]),
    tech("Express", TechnologyKind::Framework, &["express", "expressjs"]),
    tech("Django", TechnologyKind::Framework, &["django"]),
    tech("Flask", TechnologyKind::Framework, &["flask"]),
    tech("FastAPI", TechnologyKind::Framework, &["fastapi"]),
    tech("Rails", TechnologyKind::Framework, &["rails", "rubyonrails"]),
    tech("Spring", TechnologyKind::Framework, &["spring", "springboot"]),
    tech("Actix", TechnologyKind::Framework, &["actix", "actixweb"]),
    tech("Axum", TechnologyKind::Framework, &["axum"]),
    tech("Tokio", TechnologyKind::Framework, &["tokio"]),
    tech("Tailwind CSS", TechnologyKind::Framework, &["tailwind", "tailwindcss"]),
    tech("TensorFlow", TechnologyKind::Framework, &["tensorflow"]),
    tech("PyTorch", TechnologyKind::Framework, &["pytorch"]),
    tech("Flutter", TechnologyKind::Framework, &["flutter"]),
    tech("PostgreSQL", TechnologyKind::Database, &["postgres", "postgresql"]),
    tech("MySQL", TechnologyKind::Database, &["mysql"]),
    tech("MongoDB", TechnologyKind::Database, &["mongodb", "mongo"]),
    tech("Redis", TechnologyKind::Database, &["redis"]),
    tech("SQLite", TechnologyKind::Database, &["sqlite"]),
    tech("AWS", TechnologyKind::Cloud, &["aws", "lambda"]),
    tech("GCP", TechnologyKind::Cloud, &["gcp", "googlecloud"]),
    tech("Azure", TechnologyKind::Cloud, &["azure"]),
    tech("Firebase", TechnologyKind::Cloud, &["firebase"]),
    tech("Vercel", TechnologyKind::Cloud, &["vercel"]),
    tech("Docker", TechnologyKind::Tooling, &["docker", "dockerfile"]),
    tech("Kubernetes", TechnologyKind::Tooling, &["kubernetes", "k8s"]),
    tech("Terraform", TechnologyKind::Tooling, &["terraform"]),
    tech("GraphQL", TechnologyKind::Tooling, &["graphql"]),
    tech("GitHub Actions", TechnologyKind::Tooling, &["githubactions"]),
    tech("Webpack", TechnologyKind::Tooling, &["webpack"]),
    tech("Vite", TechnologyKind::Tooling, &["vite"]),
];

/// Kind of a technology name: catalog entries by their kind, anything else
/// is a GitHub language
pub fn technology_kind(name: &str) -> TechnologyKind {
    TECHNOLOGY_CATALOG
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.kind)
        .unwrap_or(TechnologyKind::Language)
}

/// Lowercased alphanumeric tokens of topics, name and description.
///
/// Adjacent token pairs are also joined so that "next.js", "machine
/// learning" and "react-native" match `nextjs`, `machinelearning` and
/// `reactnative`.
fn keyword_tokens(repo: &GitHubRepo) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();

    let sources = repo
        .topics
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(repo.name.as_str()))
        .chain(repo.description.as_deref());

    for text in sources {
        let words: Vec<String> = split_words(text);
        for pair in words.windows(2) {
            tokens.insert(format!("{}{}", pair[0], pair[1]));
        }
        tokens.extend(words);
    }

    tokens
}

fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();

    // camelCase boundaries split too: "MyCliTool" -> my, cli, tool
    let mut prev_lower = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if c.is_uppercase() && prev_lower && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
            current.extend(c.to_lowercase());
        } else {
            prev_lower = false;
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// Category of a repository by keyword rules, then by primary language
pub fn categorize(repo: &GitHubRepo) -> ProjectCategory {
    let tokens = keyword_tokens(repo);

    for (category, keywords) in CATEGORY_RULES {
        if keywords.iter().any(|k| tokens.contains(*k)) {
            return *category;
        }
    }

    repo.language
        .as_deref()
        .and_then(|language| {
            LANGUAGE_FALLBACK
                .iter()
                .find(|(name, _)| *name == language)
                .map(|(_, category)| *category)
        })
        .unwrap_or(ProjectCategory::Other)
}

/// GitHub languages (largest first) followed by catalog technologies found
/// in the repository keywords
pub fn detect_technologies(repo: &GitHubRepo, languages: &LanguageBreakdown) -> Vec<String> {
    let mut by_size: Vec<(&String, &u64)> = languages.iter().collect();
    by_size.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let mut technologies: Vec<String> = by_size.into_iter().map(|(l, _)| l.clone()).collect();

    if technologies.is_empty() {
        if let Some(language) = &repo.language {
            technologies.push(language.clone());
        }
    }

    let tokens = keyword_tokens(repo);
    for entry in TECHNOLOGY_CATALOG {
        if entry.aliases.iter().any(|a| tokens.contains(*a))
            && !technologies.iter().any(|t| t == entry.name)
        {
            technologies.push(entry.name.to_string());
        }
    }

    technologies
}

fn age(now: DateTime<Utc>, at: Option<DateTime<Utc>>) -> Option<Duration> {
    at.map(|at| now - at)
}

/// Pushed within the active window
pub fn is_active(repo: &GitHubRepo, now: DateTime<Utc>) -> bool {
    age(now, repo.pushed_at).is_some_and(|age| age <= Duration::days(ACTIVE_WINDOW_DAYS))
}

/// `stars * 2 + forks * 3 + recency bonus`, halved for archived repositories
pub fn project_score(repo: &GitHubRepo, now: DateTime<Utc>) -> u32 {
    let recency_bonus = age(now, repo.pushed_at)
        .and_then(|age| {
            RECENCY_BONUS
                .iter()
                .find(|(days, _)| age <= Duration::days(*days))
                .map(|(_, bonus)| *bonus)
        })
        .unwrap_or(0);

    let score = repo
        .stargazers_count
        .saturating_mul(2)
        .saturating_add(repo.forks_count.saturating_mul(3))
        .saturating_add(recency_bonus);

    if repo.archived { score / 2 } else { score }
}

pub fn classify_repository(
    repo: &GitHubRepo,
    languages: &LanguageBreakdown,
    now: DateTime<Utc>,
) -> Project {
    Project {
        name: repo.name.clone(),
        description: repo.description.clone(),
        url: repo.html_url.clone(),
        homepage: repo.homepage.clone().filter(|h| !h.trim().is_empty()),
        category: categorize(repo),
        primary_language: repo.language.clone(),
        technologies: detect_technologies(repo, languages),
        topics: repo.topics.clone(),
        stars: repo.stargazers_count,
        forks: repo.forks_count,
        archived: repo.archived,
        created_at: repo.created_at,
        pushed_at: repo.pushed_at,
        is_active: is_active(repo, now),
        score: project_score(repo, now),
    }
}

/// Classify every non-fork repository, best score first
pub fn select_projects(
    repos: &[GitHubRepo],
    languages: &HashMap<String, LanguageBreakdown>,
    now: DateTime<Utc>,
) -> Vec<Project> {
    let empty = LanguageBreakdown::new();

    let mut projects: Vec<Project> = repos
        .iter()
        .filter(|repo| !repo.fork)
        .map(|repo| {
            let breakdown = languages.get(&repo.name).unwrap_or(&empty);
            classify_repository(repo, breakdown, now)
        })
        .collect();

    projects.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
    projects
}

/// Top non-archived projects; `projects` must already be ranked
pub fn featured_projects(projects: &[Project], limit: Option<usize>) -> Vec<Project> {
    let limit = limit
        .unwrap_or(DEFAULT_FEATURED_LIMIT)
        .clamp(1, MAX_FEATURED_LIMIT);

    projects
        .iter()
        .filter(|p| !p.archived)
        .take(limit)
        .cloned()
        .collect()
}
