// src/project.rs

use actix_web::{web, HttpResponse};
use log::{debug, info};
use serde_json::json;

use crate::access::{ensure_access, ensure_owner};
use crate::app_state::AppState;
use crate::auth::Identity;
use crate::error::{AppError, AppResult};
use crate::models::project::{CreateProjectRequest, UpdateProjectRequest};
use crate::models::{new_id, Project, ProjectView, UserSummary};

/// Fetches a project or fails with "Project not found".
pub(crate) async fn load(state: &AppState, project_id: &str) -> AppResult<Project> {
    state
        .projects
        .find_by_id(project_id)
        .await?
        .ok_or_else(|| AppError::not_found("Project not found"))
}

/// Stamps `updated_at` and writes the aggregate back, failing with
/// `Conflict` when someone else saved it since it was loaded.
pub(crate) async fn persist(state: &AppState, project: &mut Project) -> AppResult<()> {
    project.touch();
    state.projects.save(project).await?;
    Ok(())
}

async fn summaries(state: &AppState, ids: &[String]) -> AppResult<Vec<UserSummary>> {
    let users = state.users.find_many(ids).await?;
    Ok(users.iter().map(UserSummary::from).collect())
}

pub(crate) async fn populate(state: &AppState, project: Project) -> AppResult<ProjectView> {
    let users = summaries(state, &project.referenced_users()).await?;
    Ok(project.into_view(&users))
}

async fn populate_all(state: &AppState, projects: Vec<Project>) -> AppResult<Vec<ProjectView>> {
    let mut ids: Vec<String> = projects.iter().flat_map(Project::referenced_users).collect();
    ids.sort();
    ids.dedup();
    let users = summaries(state, &ids).await?;
    Ok(projects.into_iter().map(|p| p.into_view(&users)).collect())
}

pub async fn create(
    state: &AppState,
    caller: &Identity,
    req: CreateProjectRequest,
) -> AppResult<Project> {
    let project = Project::create(new_id(), &caller.id, req)?;
    state.projects.insert(&project).await?;
    info!("Project {} created by {}", project.id, caller.id);
    Ok(project)
}

/// Projects the caller owns or belongs to, newest first.
pub async fn list(state: &AppState, caller: &Identity) -> AppResult<Vec<ProjectView>> {
    let mut projects = state.projects.find_for_user(&caller.id).await?;
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    populate_all(state, projects).await
}

pub async fn get(state: &AppState, caller: &Identity, project_id: &str) -> AppResult<ProjectView> {
    let project = load(state, project_id).await?;
    ensure_access(&project, caller, "access this project")?;
    populate(state, project).await
}

pub async fn update(
    state: &AppState,
    caller: &Identity,
    project_id: &str,
    patch: UpdateProjectRequest,
) -> AppResult<ProjectView> {
    let mut project = load(state, project_id).await?;
    ensure_owner(&project, caller, "update this project")?;

    project.apply_patch(patch)?;
    persist(state, &mut project).await?;
    debug!("Project {} updated to version {}", project.id, project.version);
    populate(state, project).await
}

/// Removes the project and every message posted to it. Tasks and
/// resources go with the document.
///
/// Messages are removed first so a failure leaves the project in place
/// and the request can be retried.
pub async fn delete(state: &AppState, caller: &Identity, project_id: &str) -> AppResult<()> {
    let project = load(state, project_id).await?;
    ensure_owner(&project, caller, "delete this project")?;

    let removed = state.messages.delete_by_project(&project.id).await?;
    if !state.projects.delete(&project.id).await? {
        return Err(AppError::not_found("Project not found"));
    }
    info!("Project {} removed with {} messages", project.id, removed);
    Ok(())
}

/// POST /projects
pub async fn create_project(
    caller: Identity,
    data: web::Data<AppState>,
    payload: web::Json<CreateProjectRequest>,
) -> AppResult<HttpResponse> {
    let project = create(&data, &caller, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(project))
}

/// GET /projects
pub async fn list_projects(caller: Identity, data: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(list(&data, &caller).await?))
}

/// GET /projects/{project_id}
pub async fn get_project(
    caller: Identity,
    data: web::Data<AppState>,
    project_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(get(&data, &caller, &project_id).await?))
}

/// PUT /projects/{project_id}
pub async fn update_project(
    caller: Identity,
    data: web::Data<AppState>,
    project_id: web::Path<String>,
    payload: web::Json<UpdateProjectRequest>,
) -> AppResult<HttpResponse> {
    let project = update(&data, &caller, &project_id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}

/// DELETE /projects/{project_id}
pub async fn delete_project(
    caller: Identity,
    data: web::Data<AppState>,
    project_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    delete(&data, &caller, &project_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Project removed" })))
}
