//! Shared fixtures for the in-crate tests.

use actix_web::http::header::{HeaderName, AUTHORIZATION};

use crate::app_state::AppState;
use crate::auth::{create_jwt, register_user, Identity, RegisterRequest};
use crate::models::User;

/// Builds the full app over `state` the same way `main` does.
macro_rules! test_app {
    ($state:expr) => {{
        let state: $crate::app_state::AppState = $state;
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap($crate::auth::Authentication::new(state.config.jwt_secret.clone()))
                .app_data(actix_web::web::Data::new(state))
                .configure($crate::routes::configure)
                .default_service(actix_web::web::to($crate::routes::not_found)),
        )
        .await
    }};
}
pub(crate) use test_app;

/// Registers a user with password `password` and returns the stored record.
pub async fn seed_user(state: &AppState, name: &str, email: &str) -> User {
    register_user(
        state,
        RegisterRequest {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some("password".to_string()),
        },
    )
    .await
    .unwrap();
    state.users.find_by_email(email).await.unwrap().unwrap()
}

pub fn caller(user: &User) -> Identity {
    Identity {
        id: user.id.clone(),
        role: user.role,
    }
}

pub fn token_for(state: &AppState, user: &User) -> String {
    create_jwt(user, &state.config.jwt_secret, state.config.jwt_ttl_hours).unwrap()
}

pub fn bearer(token: &str) -> (HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {}", token))
}
