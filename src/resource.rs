// src/resource.rs

use actix_web::{web, HttpResponse};
use log::info;

use crate::access::{ensure_access, ensure_can_remove_resource};
use crate::app_state::AppState;
use crate::auth::Identity;
use crate::error::{AppError, AppResult};
use crate::models::resource::NewResource;
use crate::models::{new_id, Project, Resource};
use crate::project::{load, persist};

/// Attaches a link to the project on behalf of an owner or team member.
/// The input is validated before membership is checked.
pub async fn add(
    state: &AppState,
    caller: &Identity,
    project_id: &str,
    input: NewResource,
) -> AppResult<Project> {
    let resource = Resource::create(new_id(), &caller.id, input)?;
    let mut project = load(state, project_id).await?;
    ensure_access(&project, caller, "add resources to this project")?;

    let resource_id = resource.id.clone();
    project.resources.push(resource);
    persist(state, &mut project).await?;
    info!("{} added resource {} to project {}", caller.id, resource_id, project.id);
    Ok(project)
}

pub async fn delete(
    state: &AppState,
    caller: &Identity,
    project_id: &str,
    resource_id: &str,
) -> AppResult<Project> {
    let mut project = load(state, project_id).await?;
    let resource = project
        .resource(resource_id)
        .ok_or_else(|| AppError::not_found("Resource not found"))?;
    ensure_can_remove_resource(&project, resource, caller)?;

    project.remove_resource(resource_id)?;
    persist(state, &mut project).await?;
    info!("{} removed resource {} from project {}", caller.id, resource_id, project.id);
    Ok(project)
}

pub async fn list(state: &AppState, caller: &Identity, project_id: &str) -> AppResult<Vec<Resource>> {
    let project = load(state, project_id).await?;
    ensure_access(&project, caller, "access this project")?;
    let mut resources = project.resources;
    resources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(resources)
}

// POST /projects/{project_id}/resources
pub async fn add_resource(
    caller: Identity,
    data: web::Data<AppState>,
    project_id: web::Path<String>,
    payload: web::Json<NewResource>,
) -> AppResult<HttpResponse> {
    let project = add(&data, &caller, &project_id, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(project))
}

// DELETE /projects/{project_id}/resources/{resource_id}
pub async fn delete_resource(
    caller: Identity,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (project_id, resource_id) = path.into_inner();
    let project = delete(&data, &caller, &project_id, &resource_id).await?;
    Ok(HttpResponse::Ok().json(project))
}

// GET /projects/{project_id}/resources
pub async fn list_resources(
    caller: Identity,
    data: web::Data<AppState>,
    project_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(list(&data, &caller, &project_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::CreateProjectRequest;
    use crate::models::{date, ResourceType};
    use crate::test_support::{caller, seed_user};

    struct Fixture {
        state: AppState,
        project: Project,
        owner: Identity,
        member: Identity,
        other_member: Identity,
        stranger: Identity,
    }

    async fn fixture() -> Fixture {
        let state = AppState::in_memory();
        let owner = caller(&seed_user(&state, "Owner", "owner@example.com").await);
        let member = caller(&seed_user(&state, "Member", "member@example.com").await);
        let other_member = caller(&seed_user(&state, "Other", "other@example.com").await);
        let stranger = caller(&seed_user(&state, "Stranger", "stranger@example.com").await);
        let project = crate::project::create(
            &state,
            &owner,
            CreateProjectRequest {
                name: Some("Alpha".into()),
                start_date: date::parse("2025-01-01"),
                team: Some(vec![member.id.clone(), other_member.id.clone()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        Fixture {
            state,
            project,
            owner,
            member,
            other_member,
            stranger,
        }
    }

    fn link(url: &str) -> NewResource {
        NewResource {
            name: Some("Board".into()),
            kind: Some(ResourceType::Link),
            url: Some(url.into()),
            description: None,
        }
    }

    fn find_by_url<'a>(project: &'a Project, url: &str) -> &'a Resource {
        project.resources.iter().find(|r| r.url == url).unwrap()
    }

    #[actix_web::test]
    async fn member_can_add_and_creator_is_recorded() {
        let f = fixture().await;
        let url = "https://example.com/board";
        let project = add(&f.state, &f.member, &f.project.id, link(url)).await.unwrap();
        let res = find_by_url(&project, url);
        assert_eq!(res.created_by, f.member.id);
        assert_eq!(res.description, "");
    }

    #[actix_web::test]
    async fn stranger_cannot_add() {
        let f = fixture().await;
        let err = add(&f.state, &f.stranger, &f.project.id, link("https://example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(msg) if msg.starts_with("Not authorized")));
    }

    #[actix_web::test]
    async fn malformed_url_is_a_bad_request() {
        let f = fixture().await;
        let err = add(&f.state, &f.owner, &f.project.id, link("not-a-valid-url"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let stored = load(&f.state, &f.project.id).await.unwrap();
        assert!(stored.resources.is_empty());
    }

    #[actix_web::test]
    async fn only_owner_or_creator_can_delete() {
        let f = fixture().await;
        let url = "https://example.com/doc";
        let project = add(&f.state, &f.member, &f.project.id, link(url)).await.unwrap();
        let resource_id = find_by_url(&project, url).id.clone();

        let err = delete(&f.state, &f.other_member, &f.project.id, &resource_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let project = delete(&f.state, &f.owner, &f.project.id, &resource_id).await.unwrap();
        assert!(project.resources.is_empty());

        assert!(matches!(
            delete(&f.state, &f.owner, &f.project.id, &resource_id).await,
            Err(AppError::NotFound(msg)) if msg == "Resource not found"
        ));
    }

    #[actix_web::test]
    async fn creator_can_delete_own_resource() {
        let f = fixture().await;
        let url = "https://example.com/mine";
        let project = add(&f.state, &f.member, &f.project.id, link(url)).await.unwrap();
        let resource_id = find_by_url(&project, url).id.clone();
        assert!(delete(&f.state, &f.member, &f.project.id, &resource_id).await.is_ok());
    }

    #[actix_web::test]
    async fn missing_project_is_not_found() {
        let f = fixture().await;
        assert!(matches!(
            add(&f.state, &f.owner, "missing", link("https://example.com")).await,
            Err(AppError::NotFound(msg)) if msg == "Project not found"
        ));
        assert!(matches!(
            delete(&f.state, &f.owner, "missing", "r1").await,
            Err(AppError::NotFound(msg)) if msg == "Project not found"
        ));
    }
}
