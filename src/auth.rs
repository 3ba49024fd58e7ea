use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http, web, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use futures::future::{ok, ready, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{new_id, Role, User, UserProfile};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub role: Role,
    pub exp: usize,
}

/// The authenticated caller, placed in request extensions by
/// [`Authentication`] and pulled out by handlers as an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Identity>()
                .cloned()
                .ok_or_else(|| AppError::Unauthenticated("Not authorized, no token".to_string())),
        )
    }
}

pub fn create_jwt(user: &User, secret: &str, ttl_hours: i64) -> AppResult<String> {
    let expiration = Utc::now() + Duration::hours(ttl_hours);
    let claims = Claims {
        sub: user.id.clone(),
        role: user.role,
        exp: expiration.timestamp() as usize,
    };
    Ok(encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))?)
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Resolves `Authorization: Bearer <jwt>` to an [`Identity`].
///
/// Requests without a bearer header pass through untouched; routes that need
/// a caller reject them through the `Identity` extractor. A bearer header
/// with a bad token is answered with 401 right here.
pub struct Authentication {
    secret: Rc<String>,
}

impl Authentication {
    pub fn new(secret: impl Into<String>) -> Self {
        Authentication {
            secret: Rc::new(secret.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = AuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddleware {
            service,
            secret: self.secret.clone(),
        })
    }
}

pub struct AuthMiddleware<S> {
    service: S,
    secret: Rc<String>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string());

        if let Some(token) = token {
            match validate_jwt(&token, &self.secret) {
                Ok(claims) => {
                    debug!("Authenticated user {}", claims.sub);
                    req.extensions_mut().insert(Identity {
                        id: claims.sub,
                        role: claims.role,
                    });
                }
                Err(e) => {
                    warn!("Rejected bearer token: {}", e);
                    let resp = req.error_response(AppError::Unauthenticated(
                        "Not authorized, token failed".to_string(),
                    ));
                    return Box::pin(async move { Ok(resp) });
                }
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_boxed_body())
        })
    }
}

pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    web::block(move || hash(password, cost))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::from)
}

async fn verify_password(password: String, hashed: String) -> AppResult<bool> {
    let matched = web::block(move || verify(password, &hashed))
        .await
        .map_err(AppError::internal)?;
    Ok(matched.unwrap_or(false))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub role: Role,
    pub token: String,
}

impl AuthResponse {
    fn new(user: &User, token: String) -> Self {
        AuthResponse {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            role: user.role,
            token,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Creates the account and signs the caller in.
pub async fn register_user(state: &AppState, req: RegisterRequest) -> AppResult<AuthResponse> {
    let (name, email) = match (non_empty(req.name), non_empty(req.email)) {
        (Some(name), Some(email)) => (name, email),
        _ => return Err(AppError::bad_request("Name, email and password are required")),
    };
    let password = match req.password {
        Some(password) if !password.is_empty() => password,
        _ => return Err(AppError::bad_request("Name, email and password are required")),
    };

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::bad_request("User already exists"));
    }

    let now = Utc::now();
    let user = User {
        id: new_id(),
        name,
        email,
        password: hash_password(password, state.config.bcrypt_cost).await?,
        avatar: String::new(),
        role: Role::User,
        created_at: now,
        updated_at: now,
    };
    state.users.insert(&user).await?;
    info!("Registered user {}", user.id);

    let token = create_jwt(&user, &state.config.jwt_secret, state.config.jwt_ttl_hours)?;
    Ok(AuthResponse::new(&user, token))
}

pub async fn login_user(state: &AppState, req: LoginRequest) -> AppResult<AuthResponse> {
    let invalid = || AppError::Unauthenticated("Invalid email or password".to_string());

    let user = state.users.find_by_email(&req.email).await?.ok_or_else(invalid)?;
    if !verify_password(req.password, user.password.clone()).await? {
        return Err(invalid());
    }

    let token = create_jwt(&user, &state.config.jwt_secret, state.config.jwt_ttl_hours)?;
    Ok(AuthResponse::new(&user, token))
}

// POST /auth/register
pub async fn register(
    data: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let created = register_user(&data, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

// POST /auth/login
pub async fn login(
    data: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let session = login_user(&data, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(session))
}

// GET /auth/profile
pub async fn profile(caller: Identity, data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let user = data
        .users
        .find_by_id(&caller.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(HttpResponse::Ok().json(UserProfile::from(&user)))
}
