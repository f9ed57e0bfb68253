//! A fake GitHub REST API served on a random local port

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use actix_web::{App, HttpResponse, HttpServer, web};
use serde_json::{Value, json};

pub const LOGIN: &str = "octocat";

/// Number of repositories the fake account owns (spans two pages)
pub const REPO_COUNT: usize = 120;

#[derive(Default)]
pub struct Hits {
    pub total: AtomicUsize,
    pub repos: AtomicUsize,
}

pub struct FakeGitHub {
    pub base_url: String,
    pub hits: Arc<Hits>,
}

pub fn repo_json(index: usize) -> Value {
    let name = if index == 0 {
        "alpha".to_string()
    } else {
        format!("repo-{index:03}")
    };
    json!({
        "id": index + 1,
        "name": name,
        "full_name": format!("{LOGIN}/{name}"),
        "html_url": format!("https://github.com/{LOGIN}/{name}"),
        "description": null,
        "language": "Rust",
        "topics": [],
        "fork": index % 10 == 9,
        "archived": false,
        "stargazers_count": index,
        "forks_count": 0,
        "created_at": "2023-01-15T00:00:00Z",
        "updated_at": "2024-05-01T00:00:00Z",
        "pushed_at": null
    })
}

async fn user(path: web::Path<String>, hits: web::Data<Arc<Hits>>) -> HttpResponse {
    hits.total.fetch_add(1, Ordering::SeqCst);
    if path.as_str() != LOGIN {
        return HttpResponse::NotFound().json(json!({ "message": "Not Found" }));
    }
    HttpResponse::Ok().json(json!({
        "login": LOGIN,
        "id": 583231,
        "name": "The Octocat",
        "avatar_url": "https://avatars.githubusercontent.com/u/583231",
        "html_url": "https://github.com/octocat",
        "followers": 42,
        "created_at": "2011-01-25T18:44:36Z",
        "updated_at": "2024-05-01T00:00:00Z"
    }))
}

async fn repos(
    query: web::Query<HashMap<String, String>>,
    hits: web::Data<Arc<Hits>>,
) -> HttpResponse {
    hits.total.fetch_add(1, Ordering::SeqCst);
    hits.repos.fetch_add(1, Ordering::SeqCst);

    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: usize = query
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(30);

    let start = (page - 1) * per_page;
    let items: Vec<Value> = (start..REPO_COUNT.min(start + per_page))
        .map(repo_json)
        .collect();
    HttpResponse::Ok().json(items)
}

async fn commits(path: web::Path<(String, String)>, hits: web::Data<Arc<Hits>>) -> HttpResponse {
    hits.total.fetch_add(1, Ordering::SeqCst);
    let (_, repo) = path.into_inner();
    match repo.as_str() {
        "empty" => HttpResponse::Conflict().json(json!({ "message": "Git Repository is empty." })),
        "limited" => HttpResponse::Forbidden()
            .insert_header(("x-ratelimit-remaining", "0"))
            .insert_header(("x-ratelimit-reset", "4102444800"))
            .json(json!({ "message": "API rate limit exceeded" })),
        _ => HttpResponse::Ok().json(json!([{
            "sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e",
            "html_url": format!("https://github.com/{LOGIN}/{repo}/commit/6dcb09b"),
            "commit": {
                "message": "Fix all the bugs\n\nAnd some more",
                "author": { "name": "Monalisa Octocat", "date": "2024-05-01T10:00:00Z" }
            },
            "author": { "login": LOGIN }
        }])),
    }
}

async fn contributors(
    path: web::Path<(String, String)>,
    hits: web::Data<Arc<Hits>>,
) -> HttpResponse {
    hits.total.fetch_add(1, Ordering::SeqCst);
    let (_, repo) = path.into_inner();
    match repo.as_str() {
        // GitHub answers 204 while contributor stats are not computed yet
        "empty" => HttpResponse::NoContent().finish(),
        _ => HttpResponse::Ok()
            .insert_header(("x-ratelimit-remaining", "5"))
            .insert_header(("x-ratelimit-reset", "4102444800"))
            .json(json!([{
                "login": LOGIN,
                "avatar_url": "https://avatars.githubusercontent.com/u/583231",
                "html_url": "https://github.com/octocat",
                "contributions": 32
            }])),
    }
}

async fn readme(path: web::Path<(String, String)>, hits: web::Data<Arc<Hits>>) -> HttpResponse {
    hits.total.fetch_add(1, Ordering::SeqCst);
    let (_, repo) = path.into_inner();
    HttpResponse::Ok().json(json!({
        "name": "README.md",
        "html_url": format!("https://github.com/{LOGIN}/{repo}/blob/main/README.md"),
        "encoding": "base64",
        // "# Hello\n" split across lines the way GitHub wraps it
        "content": "IyBI\nZWxs\nbwo=\n"
    }))
}

async fn rate_limit(hits: web::Data<Arc<Hits>>) -> HttpResponse {
    hits.total.fetch_add(1, Ordering::SeqCst);
    HttpResponse::Ok().json(json!({
        "resources": {
            "core": { "limit": 60, "remaining": 57, "used": 3, "reset": 1714560000 }
        }
    }))
}

/// Start the fake API and return its base URL
pub async fn start() -> std::io::Result<FakeGitHub> {
    let hits = Arc::new(Hits::default());
    let data = web::Data::new(hits.clone());

    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/users/{username}", web::get().to(user))
            .route("/users/{username}/repos", web::get().to(repos))
            .route("/repos/{owner}/{repo}/commits", web::get().to(commits))
            .route(
                "/repos/{owner}/{repo}/contributors",
                web::get().to(contributors),
            )
            .route("/repos/{owner}/{repo}/readme", web::get().to(readme))
            .route("/rate_limit", web::get().to(rate_limit))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))?;

    let addr = server.addrs()[0];
    actix_rt::spawn(server.run());

    Ok(FakeGitHub {
        base_url: format!("http://{addr}"),
        hits,
    })
}
