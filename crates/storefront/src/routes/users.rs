//! Signup, login and account lookups.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cartwheel_core::{UserId, Username};

use crate::error::{ApiJson, Result};
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::AuthService;
use crate::state::AppState;

/// Body of `POST /users` and `POST /users/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    message: &'static str,
    user_id: UserId,
    username: Username,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
    user_id: UserId,
}

/// Create an account.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let user = AuthService::new(state.pool(), state.tokens())
        .register(&request.username, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully",
            user_id: user.id,
            username: user.username,
        }),
    ))
}

/// Exchange a username and password for a bearer token.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CredentialsRequest>,
) -> Result<Json<LoginResponse>> {
    let login = AuthService::new(state.pool(), state.tokens())
        .login(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token: login.token,
        user_id: login.user_id,
    }))
}

/// The authenticated user's own record.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn me(State(state): State<AppState>, RequireAuth(user_id): RequireAuth) -> Result<Json<User>> {
    let user = AuthService::new(state.pool(), state.tokens())
        .get_user(user_id)
        .await?;
    Ok(Json(user))
}

/// All users, without credentials.
#[instrument(skip_all)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    let users = AuthService::new(state.pool(), state.tokens())
        .list_users()
        .await?;
    Ok(Json(users))
}
