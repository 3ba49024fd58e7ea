// team_management.rs

use actix_web::{web, HttpResponse};
use log::info;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::auth::Identity;
use crate::error::{AppError, AppResult};
use crate::models::ProjectView;
use crate::project::{load, persist, populate};

/// Body of `POST /projects/{id}/team`: a user id, or an email to look up.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Option<String>,
    pub email: Option<String>,
}

async fn resolve_member(state: &AppState, req: AddMemberRequest) -> AppResult<String> {
    let user = if let Some(user_id) = req.user_id.filter(|id| !id.trim().is_empty()) {
        state.users.find_by_id(user_id.trim()).await?
    } else {
        match req.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()) {
            Some(email) => state.users.find_by_email(&email).await?,
            None => return Err(AppError::bad_request("A user id or email is required")),
        }
    };
    user.map(|user| user.id)
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// Adds a member to the team. Any authenticated caller may do this.
pub async fn add_member(
    state: &AppState,
    caller: &Identity,
    project_id: &str,
    req: AddMemberRequest,
) -> AppResult<ProjectView> {
    let mut project = load(state, project_id).await?;
    let member_id = resolve_member(state, req).await?;

    project.add_member(&member_id)?;
    persist(state, &mut project).await?;
    info!("{} added {} to project {}", caller.id, member_id, project.id);
    populate(state, project).await
}

/// Drops a member from the team; removing someone who is not on it
/// changes nothing and still succeeds.
pub async fn remove_member(
    state: &AppState,
    caller: &Identity,
    project_id: &str,
    member_id: &str,
) -> AppResult<ProjectView> {
    let mut project = load(state, project_id).await?;

    if project.remove_member(member_id) {
        persist(state, &mut project).await?;
        info!("{} removed {} from project {}", caller.id, member_id, project.id);
    }
    populate(state, project).await
}

// POST /projects/{project_id}/team
pub async fn add_team_member(
    caller: Identity,
    data: web::Data<AppState>,
    project_id: web::Path<String>,
    payload: web::Json<AddMemberRequest>,
) -> AppResult<HttpResponse> {
    let project = add_member(&data, &caller, &project_id, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(project))
}

// DELETE /projects/{project_id}/team/{user_id}
pub async fn remove_team_member(
    caller: Identity,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (project_id, user_id) = path.into_inner();
    let project = remove_member(&data, &caller, &project_id, &user_id).await?;
    Ok(HttpResponse::Ok().json(project))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::CreateProjectRequest;
    use crate::models::{date, Project};
    use crate::test_support::{caller, seed_user};

    async fn seeded() -> (AppState, Project, crate::models::User, crate::models::User) {
        let state = AppState::in_memory();
        let owner = seed_user(&state, "Owner", "owner@example.com").await;
        let other = seed_user(&state, "Other", "other@example.com").await;
        let project = crate::project::create(
            &state,
            &caller(&owner),
            CreateProjectRequest {
                name: Some("Alpha".into()),
                start_date: date::parse("2025-01-01"),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        (state, project, owner, other)
    }

    #[actix_web::test]
    async fn adding_by_email_resolves_the_user() {
        let (state, project, owner, other) = seeded().await;
        let req = AddMemberRequest {
            email: Some("other@example.com".into()),
            ..Default::default()
        };
        let view = add_member(&state, &caller(&owner), &project.id, req).await.unwrap();
        assert_eq!(view.team.len(), 1);
        assert_eq!(view.team[0].id, other.id);
        assert_eq!(view.team[0].name, "Other");
    }

    #[actix_web::test]
    async fn unknown_email_is_not_found() {
        let (state, project, owner, _) = seeded().await;
        let req = AddMemberRequest {
            email: Some("ghost@example.com".into()),
            ..Default::default()
        };
        assert!(matches!(
            add_member(&state, &caller(&owner), &project.id, req).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn unknown_user_id_is_not_found_and_team_is_untouched() {
        let (state, project, owner, _) = seeded().await;
        let req = AddMemberRequest {
            user_id: Some("ghost".into()),
            ..Default::default()
        };
        assert!(matches!(
            add_member(&state, &caller(&owner), &project.id, req).await,
            Err(AppError::NotFound(msg)) if msg == "User not found"
        ));
        let stored = state.projects.find_by_id(&project.id).await.unwrap().unwrap();
        assert!(stored.team.is_empty());
    }

    #[actix_web::test]
    async fn second_add_of_same_user_is_rejected() {
        let (state, project, owner, other) = seeded().await;
        let by_id = || AddMemberRequest {
            user_id: Some(other.id.clone()),
            ..Default::default()
        };
        add_member(&state, &caller(&owner), &project.id, by_id()).await.unwrap();
        let err = add_member(&state, &caller(&owner), &project.id, by_id())
            .await
            .unwrap_err();
        assert!(matches!(&err, AppError::BadRequest(_)));
        assert!(err.to_string().contains("already in team"));
    }

    #[actix_web::test]
    async fn non_owner_may_change_the_team() {
        let (state, project, _, other) = seeded().await;
        let req = AddMemberRequest {
            user_id: Some(other.id.clone()),
            ..Default::default()
        };
        let view = add_member(&state, &caller(&other), &project.id, req).await.unwrap();
        assert_eq!(view.team.len(), 1);

        let view = remove_member(&state, &caller(&other), &project.id, &other.id)
            .await
            .unwrap();
        assert!(view.team.is_empty());
    }

    #[actix_web::test]
    async fn removing_a_non_member_keeps_the_version() {
        let (state, project, owner, _) = seeded().await;
        let view = remove_member(&state, &caller(&owner), &project.id, "nobody")
            .await
            .unwrap();
        assert!(view.team.is_empty());
        assert_eq!(view.version, project.version);
    }
}
