use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use serde::Deserialize;
use serde_json::json;

use crate::app_state::AppState;
use crate::auth::{hash_password, Identity};
use crate::error::{AppError, AppResult};
use crate::models::{Role, User, UserProfile};

#[derive(Debug, Deserialize)]
pub struct FindUserQuery {
    pub query: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

fn ensure_admin(caller: &Identity) -> AppResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden("Not authorized as an admin"))
    }
}

async fn load_user(state: &AppState, user_id: &str) -> AppResult<User> {
    state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn list_users(state: &AppState, caller: &Identity) -> AppResult<Vec<UserProfile>> {
    ensure_admin(caller)?;
    let mut users = state.users.list().await?;
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(users.iter().map(UserProfile::from).collect())
}

/// Admins may edit anyone; everybody else only themselves, and never
/// their own role.
pub async fn update_user(
    state: &AppState,
    caller: &Identity,
    user_id: &str,
    req: UpdateUserRequest,
) -> AppResult<UserProfile> {
    if caller.id != user_id && !caller.is_admin() {
        return Err(AppError::forbidden("Not authorized to update this user"));
    }
    if req.role.is_some() {
        ensure_admin(caller)?;
    }
    let mut user = load_user(state, user_id).await?;

    if let Some(name) = req.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::bad_request("Name cannot be empty"));
        }
        user.name = name;
    }
    if let Some(email) = req.email {
        let email = email.trim().to_string();
        if email.is_empty() {
            return Err(AppError::bad_request("Email cannot be empty"));
        }
        if email != user.email && state.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::bad_request("User already exists"));
        }
        user.email = email;
    }
    if let Some(avatar) = req.avatar {
        user.avatar = avatar;
    }
    if let Some(password) = req.password {
        if password.is_empty() {
            return Err(AppError::bad_request("Password cannot be empty"));
        }
        user.password = hash_password(password, state.config.bcrypt_cost).await?;
    }
    if let Some(role) = req.role {
        user.role = role;
    }
    user.updated_at = Utc::now();

    if !state.users.update(&user).await? {
        return Err(AppError::not_found("User not found"));
    }
    info!("User {} updated by {}", user.id, caller.id);
    Ok(UserProfile::from(&user))
}

pub async fn delete_user(state: &AppState, caller: &Identity, user_id: &str) -> AppResult<()> {
    ensure_admin(caller)?;
    if !state.users.delete(user_id).await? {
        return Err(AppError::not_found("User not found"));
    }
    info!("User {} removed by {}", user_id, caller.id);
    Ok(())
}

// GET /auth/users
pub async fn get_users(caller: Identity, data: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(list_users(&data, &caller).await?))
}

// GET /users/find_user_email?query=
pub async fn find_user_email(
    _caller: Identity,
    query: web::Query<FindUserQuery>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let users = data.users.search_email(&query.query).await?;
    let profiles: Vec<UserProfile> = users.iter().map(UserProfile::from).collect();
    Ok(HttpResponse::Ok().json(profiles))
}

// GET /users/{id}
pub async fn get_user_by_id(
    _caller: Identity,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let user = load_user(&data, &path).await?;
    Ok(HttpResponse::Ok().json(UserProfile::from(&user)))
}

// PUT /users/{id}
pub async fn update_user_by_id(
    caller: Identity,
    path: web::Path<String>,
    data: web::Data<AppState>,
    payload: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let profile = update_user(&data, &caller, &path, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

// DELETE /users/{id}
pub async fn delete_user_by_id(
    caller: Identity,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    delete_user(&data, &caller, &path).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "User removed" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{caller, seed_user};

    fn admin(user: &User) -> Identity {
        Identity {
            id: user.id.clone(),
            role: Role::Admin,
        }
    }

    #[actix_web::test]
    async fn listing_users_is_admin_only() {
        let state = AppState::in_memory();
        let ada = seed_user(&state, "Ada", "ada@example.com").await;
        seed_user(&state, "Bob", "bob@example.com").await;

        assert!(matches!(
            list_users(&state, &caller(&ada)).await,
            Err(AppError::Forbidden(_))
        ));
        let users = list_users(&state, &admin(&ada)).await.unwrap();
        assert_eq!(users.len(), 2);
    }

    #[actix_web::test]
    async fn users_edit_themselves_but_not_their_role() {
        let state = AppState::in_memory();
        let ada = seed_user(&state, "Ada", "ada@example.com").await;
        let bob = seed_user(&state, "Bob", "bob@example.com").await;

        let req = UpdateUserRequest {
            name: Some("Ada L.".into()),
            ..Default::default()
        };
        let profile = update_user(&state, &caller(&ada), &ada.id, req).await.unwrap();
        assert_eq!(profile.name, "Ada L.");

        let promote = UpdateUserRequest {
            role: Some(Role::Admin),
            ..Default::default()
        };
        assert!(update_user(&state, &caller(&ada), &ada.id, promote).await.is_err());

        let other = UpdateUserRequest {
            name: Some("Hacked".into()),
            ..Default::default()
        };
        assert!(update_user(&state, &caller(&ada), &bob.id, other).await.is_err());
    }

    #[actix_web::test]
    async fn email_change_must_stay_unique() {
        let state = AppState::in_memory();
        let ada = seed_user(&state, "Ada", "ada@example.com").await;
        seed_user(&state, "Bob", "bob@example.com").await;

        let req = UpdateUserRequest {
            email: Some("bob@example.com".into()),
            ..Default::default()
        };
        let err = update_user(&state, &caller(&ada), &ada.id, req).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "User already exists"));
    }

    #[actix_web::test]
    async fn admin_deletes_users() {
        let state = AppState::in_memory();
        let ada = seed_user(&state, "Ada", "ada@example.com").await;
        let bob = seed_user(&state, "Bob", "bob@example.com").await;

        delete_user(&state, &admin(&ada), &bob.id).await.unwrap();
        assert!(state.users.find_by_id(&bob.id).await.unwrap().is_none());
        assert!(matches!(
            delete_user(&state, &admin(&ada), &bob.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
