// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::attempt::{RecordAnswerRequest, StartAttemptRequest, SubmitAttemptRequest},
    services::attempts,
    state::AppState,
    utils::{json::AppJson, jwt::Claims, path::AppPath},
};

/// Starts a new attempt on a quiz for the calling student.
pub async fn start_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let principal = claims.principal()?;

    let attempt = attempts::start_attempt(
        state.quizzes.as_ref(),
        state.attempts.as_ref(),
        &principal,
        payload.quiz_id,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Records (or replaces) the answer to one question of an open attempt.
pub async fn record_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<RecordAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let principal = claims.principal()?;

    let answer = attempts::record_answer(
        state.quizzes.as_ref(),
        state.attempts.as_ref(),
        &principal,
        payload,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(answer)))
}

/// Submits an attempt and returns it graded.
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let principal = claims.principal()?;

    let graded =
        attempts::submit_attempt(state.attempts.as_ref(), &principal, payload.attempt_id).await?;

    Ok(Json(graded))
}

/// Returns an attempt with its answers. Owning student only.
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let principal = claims.principal()?;

    let detail = attempts::get_attempt(
        state.quizzes.as_ref(),
        state.attempts.as_ref(),
        &principal,
        id,
    )
    .await?;

    Ok(Json(detail))
}

/// Lists the calling student's attempts, newest first.
pub async fn list_my_attempts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let principal = claims.principal()?;
    let list = attempts::list_student_attempts(state.attempts.as_ref(), &principal).await?;

    Ok(Json(list))
}
