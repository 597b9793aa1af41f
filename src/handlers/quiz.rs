// src/handlers/quiz.rs

use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::quiz::PublicQuizDetail,
    services::catalog,
    state::AppState,
    utils::path::AppPath,
};

/// Lists active quizzes, newest first. Public.
pub async fn list_quizzes(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let quizzes = state.quizzes.list_active_quizzes().await?;

    Ok(Json(quizzes))
}

/// Returns a quiz with its questions and options for taking it.
///
/// Option correctness is withheld (PublicQuestion / PublicOption DTOs).
pub async fn get_quiz(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = catalog::quiz_detail(state.quizzes.as_ref(), id).await?;

    Ok(Json(PublicQuizDetail::from(detail)))
}
