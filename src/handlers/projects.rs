//! Project handlers
//!
//! Classified, ranked views of the owner's original repositories.

use actix_web::{HttpResponse, web};

use crate::AppState;
use crate::error::AppError;
use crate::handlers::response::cached_response;
use crate::models::{LimitQuery, ProjectQuery};

/// GET /v1/projects
///
/// Query Parameters:
/// - category: web-app, library, cli-tool, data-science, mobile, devops,
///   game, documentation or other
pub async fn list_projects(
    state: web::Data<AppState>,
    query: web::Query<ProjectQuery>,
) -> Result<HttpResponse, AppError> {
    let projects = state.portfolio.projects(query.category.as_deref()).await?;
    Ok(cached_response(projects))
}

/// GET /v1/projects/featured
///
/// Query Parameters:
/// - limit: Number of projects. Default: 6, Max: 20
pub async fn get_featured_projects(
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, AppError> {
    let projects = state.portfolio.featured_projects(query.limit).await?;
    Ok(cached_response(projects))
}

/// GET /v1/projects/{name}
pub async fn get_project(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let project = state.portfolio.project(&path).await?;
    Ok(cached_response(project))
}

pub fn configure_project_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/projects").route(web::get().to(list_projects)));
    // Registered before /projects/{name} so "featured" is not taken as a name
    cfg.service(
        web::resource("/projects/featured").route(web::get().to(get_featured_projects)),
    );
    cfg.service(web::resource("/projects/{name}").route(web::get().to(get_project)));
}
