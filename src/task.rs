// src/task.rs

use actix_web::{web, HttpResponse};
use log::{debug, info};
use serde_json::json;

use crate::access::ensure_access;
use crate::app_state::AppState;
use crate::auth::Identity;
use crate::error::AppResult;
use crate::models::{Task, TaskPayload};
use crate::project::{load, persist};

/// Creates or patches a task and returns the project's whole task list.
pub async fn put(
    state: &AppState,
    caller: &Identity,
    project_id: &str,
    payload: TaskPayload,
) -> AppResult<Vec<Task>> {
    let mut project = load(state, project_id).await?;
    let updating = payload.id.clone();

    project.upsert_task(payload)?;
    persist(state, &mut project).await?;

    match updating {
        Some(task_id) => debug!("{} updated task {} in project {}", caller.id, task_id, project.id),
        None => info!("{} added a task to project {}", caller.id, project.id),
    }
    Ok(project.tasks)
}

pub async fn delete(
    state: &AppState,
    caller: &Identity,
    project_id: &str,
    task_id: &str,
) -> AppResult<Vec<Task>> {
    let mut project = load(state, project_id).await?;

    project.remove_task(task_id)?;
    persist(state, &mut project).await?;
    info!("{} deleted task {} from project {}", caller.id, task_id, project.id);
    Ok(project.tasks)
}

pub async fn list(state: &AppState, caller: &Identity, project_id: &str) -> AppResult<Vec<Task>> {
    let project = load(state, project_id).await?;
    ensure_access(&project, caller, "access this project")?;
    Ok(project.tasks)
}

/// PUT /projects/{project_id}/tasks
pub async fn put_task(
    caller: Identity,
    data: web::Data<AppState>,
    project_id: web::Path<String>,
    payload: web::Json<TaskPayload>,
) -> AppResult<HttpResponse> {
    let tasks = put(&data, &caller, &project_id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// DELETE /projects/{project_id}/tasks/{task_id}
pub async fn delete_task(
    caller: Identity,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (project_id, task_id) = path.into_inner();
    let tasks = delete(&data, &caller, &project_id, &task_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Task removed", "tasks": tasks })))
}

/// GET /projects/{project_id}/tasks
pub async fn list_tasks(
    caller: Identity,
    data: web::Data<AppState>,
    project_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(list(&data, &caller, &project_id).await?))
}
