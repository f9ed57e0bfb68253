//! Repository handlers
//!
//! HTTP handlers for the owner's repositories and per-repository data.
//! Repository names are validated before any cache or GitHub access.

use actix_web::{HttpResponse, web};

use crate::AppState;
use crate::error::AppError;
use crate::handlers::response::cached_response;
use crate::models::{LimitQuery, RepoListQuery};

/// GET /v1/repos
///
/// Query Parameters:
/// - includeForks: Include forked repositories. Default: false
/// - sort: stars, updated or name. Default: updated
/// - limit: Maximum number of repositories. Max: 100
pub async fn list_repos(
    state: web::Data<AppState>,
    query: web::Query<RepoListQuery>,
) -> Result<HttpResponse, AppError> {
    let repos = state.portfolio.repos(&query).await?;
    Ok(cached_response(repos))
}

/// GET /v1/repos/{name}
pub async fn get_repo(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let repo = state.portfolio.repo(&path).await?;
    Ok(cached_response(repo))
}

/// GET /v1/repos/{name}/languages
pub async fn get_repo_languages(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let languages = state.portfolio.repo_languages(&path).await?;
    Ok(cached_response(languages))
}

/// GET /v1/repos/{name}/commits
///
/// Query Parameters:
/// - limit: Maximum number of commits. Default: 30, Max: 100
pub async fn get_repo_commits(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, AppError> {
    let commits = state.portfolio.repo_commits(&path, query.limit).await?;
    Ok(cached_response(commits))
}

/// GET /v1/repos/{name}/contributors
pub async fn get_repo_contributors(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let contributors = state.portfolio.repo_contributors(&path).await?;
    Ok(cached_response(contributors))
}

/// GET /v1/repos/{name}/readme
pub async fn get_repo_readme(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let readme = state.portfolio.repo_readme(&path).await?;
    Ok(cached_response(readme))
}

pub fn configure_repo_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/repos").route(web::get().to(list_repos)));
    cfg.service(web::resource("/repos/{name}").route(web::get().to(get_repo)));
    cfg.service(
        web::resource("/repos/{name}/languages").route(web::get().to(get_repo_languages)),
    );
    cfg.service(web::resource("/repos/{name}/commits").route(web::get().to(get_repo_commits)));
    cfg.service(
        web::resource("/repos/{name}/contributors").route(web::get().to(get_repo_contributors)),
    );
    cfg.service(web::resource("/repos/{name}/readme").route(web::get().to(get_repo_readme)));
}
