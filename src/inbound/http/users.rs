//! Registration and login handlers.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{NewUserAccount, UserRepositoryError};
use crate::domain::{
    AuthToken, Error, LoginCredentials, Username, auth,
};
use crate::inbound::http::error::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldErrors, field_error};

/// Body of `POST /api/v1/users`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Body of a successful registration.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub username: String,
    /// API token for `Authorization: Token <key>` requests.
    pub token: String,
}

/// Body of `POST /api/v1/login`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Body of a successful login.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub id: Uuid,
    pub username: String,
}

fn map_user_repo_error(err: UserRepositoryError) -> Error {
    match err {
        UserRepositoryError::DuplicateUsername { username } => field_error(
            "username",
            format!("username \"{username}\" is already taken"),
        ),
        UserRepositoryError::Connection { .. } | UserRepositoryError::Query { .. } => {
            Error::internal(format!("user store failure: {err}"))
        }
    }
}

fn validate_registration(request: RegisterRequest) -> Result<(Username, String), Error> {
    let mut errors = FieldErrors::new();

    let username = match request.username {
        Some(raw) => match Username::new(raw) {
            Ok(username) => Some(username),
            Err(err) => {
                errors.push("username", err.to_string());
                None
            }
        },
        None => {
            errors.missing("username");
            None
        }
    };
    let password = match request.password {
        Some(raw) => {
            if let Err(err) = auth::validate_registration_password(&raw) {
                errors.push("password", err.to_string());
                None
            } else {
                Some(raw)
            }
        }
        None => {
            errors.missing("password");
            None
        }
    };

    errors.into_result()?;
    let (Some(username), Some(password)) = (username, password) else {
        return Err(Error::internal("registration validation lost a field"));
    };
    Ok((username, password))
}

/// Register a user account and issue its API token.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation failed", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    security([]),
    operation_id = "registerUser"
)]
#[post("/api/v1/users")]
pub async fn register_user(
    state: web::Data<HttpState>,
    body: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let (username, password) = validate_registration(body.into_inner())?;
    let password_hash = auth::hash_password(&password)?;

    let registered = state
        .users
        .create(NewUserAccount {
            username,
            password_hash,
            token: AuthToken::generate(),
        })
        .await
        .map_err(map_user_repo_error)?;

    info!(user_id = %registered.user.id, "user registered");
    Ok(HttpResponse::Created().json(RegisterResponse {
        id: *registered.user.id.as_uuid(),
        username: registered.user.username.to_string(),
        token: registered.token.to_string(),
    }))
}

/// Authenticate with username and password, establishing a session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session established", body = LoginResponse),
        (status = 400, description = "Validation failed", body = Error),
        (status = 401, description = "Unknown username or wrong password", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    security([]),
    operation_id = "login"
)]
#[post("/api/v1/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    body: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    let mut errors = FieldErrors::new();
    if request.username.is_none() {
        errors.missing("username");
    }
    if request.password.is_none() {
        errors.missing("password");
    }
    errors.into_result()?;
    let (Some(username), Some(password)) = (request.username, request.password) else {
        return Err(Error::internal("login validation lost a field"));
    };

    let credentials = LoginCredentials::try_from_parts(&username, &password)
        .map_err(|err| field_error("username", err.to_string()))?;

    // Same response for unknown users and wrong passwords.
    let stored = state
        .users
        .find_by_username(credentials.username())
        .await
        .map_err(map_user_repo_error)?
        .ok_or_else(|| Error::unauthorized("invalid username or password"))?;
    if !auth::verify_password(credentials.password(), &stored.password_hash)? {
        return Err(Error::unauthorized("invalid username or password"));
    }

    session.remember_user(&stored.user.id)?;
    info!(user_id = %stored.user.id, "user logged in");
    Ok(HttpResponse::Ok().json(LoginResponse {
        id: *stored.user.id.as_uuid(),
        username: stored.user.username.to_string(),
    }))
}
