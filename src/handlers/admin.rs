// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{CreateOptionRequest, CreateQuestionRequest, UpdateQuestionRequest},
        quiz::QuizRequest,
    },
    services::{attempts, catalog},
    state::AppState,
    utils::{json::AppJson, jwt::Claims, path::AppPath},
};

/// Lists the quizzes owned by the calling admin.
pub async fn list_my_quizzes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let principal = claims.principal()?;
    let quizzes = state.quizzes.list_quizzes_by_admin(principal.id).await?;

    Ok(Json(quizzes))
}

/// Creates a quiz owned by the calling admin.
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let principal = claims.principal()?;

    let quiz = catalog::create_quiz(state.quizzes.as_ref(), &principal, payload).await?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Returns a quiz with the full answer key. Owner only.
pub async fn get_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let principal = claims.principal()?;
    let detail = catalog::owned_quiz_detail(state.quizzes.as_ref(), id, &principal).await?;

    Ok(Json(detail))
}

/// Replaces a quiz's editable fields. Owner only.
pub async fn update_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let principal = claims.principal()?;

    let quiz = catalog::update_quiz(state.quizzes.as_ref(), &principal, id, payload).await?;

    Ok(Json(quiz))
}

/// Deletes a quiz with its questions, options, attempts and answers. Owner only.
pub async fn delete_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let principal = claims.principal()?;
    catalog::delete_quiz(state.quizzes.as_ref(), &principal, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists every attempt on a quiz, newest first. Owner only.
pub async fn list_quiz_attempts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let principal = claims.principal()?;
    let list = attempts::list_quiz_attempts(
        state.quizzes.as_ref(),
        state.attempts.as_ref(),
        &principal,
        id,
    )
    .await?;

    Ok(Json(list))
}

/// Creates a quiz question.
pub async fn create_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let principal = claims.principal()?;

    let question = catalog::create_question(state.quizzes.as_ref(), &principal, payload).await?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Updates a question by ID.
pub async fn update_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let principal = claims.principal()?;

    let question =
        catalog::update_question(state.quizzes.as_ref(), &principal, id, payload).await?;

    Ok(Json(question))
}

/// Deletes a question by ID, along with its options and recorded answers.
pub async fn delete_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let principal = claims.principal()?;
    catalog::delete_question(state.quizzes.as_ref(), &principal, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Adds an option to a multiple-choice or true/false question.
pub async fn create_option(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateOptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let principal = claims.principal()?;

    let option = catalog::add_option(state.quizzes.as_ref(), &principal, payload).await?;

    Ok((StatusCode::CREATED, Json(option)))
}

pub async fn delete_option(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let principal = claims.principal()?;
    catalog::delete_option(state.quizzes.as_ref(), &principal, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists all student accounts.
pub async fn list_students(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let students = state.users.list_students().await?;

    Ok(Json(students))
}
