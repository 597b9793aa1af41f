// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{LoginRequest, RegisterRequest},
    services::accounts,
    state::AppState,
    utils::{json::AppJson, jwt::Claims},
};

/// Registers a new admin or student account.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with the user (excluding password) and a token.
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = accounts::register(state.users.as_ref(), &state.config, payload).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = accounts::login(state.users.as_ref(), &state.config, payload).await?;

    Ok(Json(response))
}

/// Returns the account behind the bearer token.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let principal = claims.principal()?;
    let user = accounts::me(state.users.as_ref(), principal.id).await?;

    Ok(Json(user))
}
