// src/services/attempts.rs

//! Attempt lifecycle: start, record answers while open, submit (which grades
//! in the same unit of work), and the read paths.
//!
//! Every check below runs before the first write, so a rejected call leaves
//! no trace in the store.

use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        attempt::{Answer, AttemptDetail, NewAnswer, QuizAttempt, RecordAnswerRequest},
        question::Question,
        user::Principal,
    },
    repositories::{AttemptRepository, QuizRepository},
    services::access,
};

pub async fn start_attempt(
    quizzes: &dyn QuizRepository,
    attempts: &dyn AttemptRepository,
    principal: &Principal,
    quiz_id: Option<Uuid>,
) -> Result<QuizAttempt, AppError> {
    let quiz_id = quiz_id.ok_or_else(|| AppError::BadRequest("Quiz ID is required".to_string()))?;
    access::find_quiz(quizzes, quiz_id).await?;

    let attempt = attempts.create_attempt(quiz_id, principal.id).await?;
    tracing::info!(
        attempt_id = %attempt.id,
        quiz_id = %quiz_id,
        student_id = %principal.id,
        "Attempt started"
    );
    Ok(attempt)
}

/// Checks the answer matches what the question type expects.
async fn validate_shape(
    quizzes: &dyn QuizRepository,
    question: &Question,
    answer_text: Option<&str>,
    selected_option_id: Option<Uuid>,
) -> Result<(), AppError> {
    if question.question_type.is_choice() {
        if answer_text.is_some() {
            return Err(AppError::BadRequest(
                "Choice questions are answered with an option, not text".to_string(),
            ));
        }
        let option_id = selected_option_id.ok_or_else(|| {
            AppError::BadRequest("Choice questions require a selected option".to_string())
        })?;
        let belongs = quizzes
            .find_option(option_id)
            .await?
            .is_some_and(|o| o.question_id == question.id);
        if !belongs {
            return Err(AppError::BadRequest(
                "Selected option does not belong to this question".to_string(),
            ));
        }
    } else {
        if selected_option_id.is_some() {
            return Err(AppError::BadRequest(
                "Short answer questions do not take an option".to_string(),
            ));
        }
        if answer_text.is_none() {
            return Err(AppError::BadRequest(
                "Short answer questions require answer text".to_string(),
            ));
        }
    }
    Ok(())
}

pub async fn record_answer(
    quizzes: &dyn QuizRepository,
    attempts: &dyn AttemptRepository,
    principal: &Principal,
    req: RecordAnswerRequest,
) -> Result<Answer, AppError> {
    let attempt_id = req
        .attempt_id
        .ok_or_else(|| AppError::BadRequest("Attempt ID is required".to_string()))?;
    let question_id = req
        .question_id
        .ok_or_else(|| AppError::BadRequest("Question ID is required".to_string()))?;

    let attempt = access::owned_attempt(attempts, attempt_id, principal).await?;
    if !attempt.status.is_open() {
        return Err(AppError::Conflict("Attempt is no longer in progress".to_string()));
    }

    let question = quizzes
        .find_question(question_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;
    if question.quiz_id != attempt.quiz_id {
        return Err(AppError::BadRequest(
            "Question does not belong to this quiz".to_string(),
        ));
    }

    let answer_text = req
        .answer_text
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());
    validate_shape(quizzes, &question, answer_text.as_deref(), req.selected_option_id).await?;

    // The store re-checks the status under its own lock.
    attempts
        .upsert_answer(NewAnswer {
            attempt_id,
            question_id,
            answer_text,
            selected_option_id: req.selected_option_id,
        })
        .await
}

/// Finalizes an open attempt and grades it in the same atomic unit.
pub async fn submit_attempt(
    attempts: &dyn AttemptRepository,
    principal: &Principal,
    attempt_id: Option<Uuid>,
) -> Result<QuizAttempt, AppError> {
    let attempt_id =
        attempt_id.ok_or_else(|| AppError::BadRequest("Attempt ID is required".to_string()))?;

    let attempt = access::owned_attempt(attempts, attempt_id, principal).await?;
    if !attempt.status.is_open() {
        return Err(AppError::Conflict("Attempt has already been submitted".to_string()));
    }

    let graded = attempts.submit_and_grade(attempt_id).await?;
    tracing::info!(
        attempt_id = %graded.id,
        score = ?graded.score,
        total_points = ?graded.total_points,
        "Attempt graded"
    );
    Ok(graded)
}

pub async fn get_attempt(
    quizzes: &dyn QuizRepository,
    attempts: &dyn AttemptRepository,
    principal: &Principal,
    attempt_id: Uuid,
) -> Result<AttemptDetail, AppError> {
    let attempt = access::owned_attempt(attempts, attempt_id, principal).await?;
    let answers = attempts.list_answers(attempt_id).await?;
    let passed = quizzes
        .find_quiz(attempt.quiz_id)
        .await?
        .and_then(|quiz| attempt.passed(quiz.passing_score));

    Ok(AttemptDetail {
        attempt,
        passed,
        answers,
    })
}

pub async fn list_student_attempts(
    attempts: &dyn AttemptRepository,
    principal: &Principal,
) -> Result<Vec<QuizAttempt>, AppError> {
    attempts.list_attempts_by_student(principal.id).await
}

pub async fn list_quiz_attempts(
    quizzes: &dyn QuizRepository,
    attempts: &dyn AttemptRepository,
    principal: &Principal,
    quiz_id: Uuid,
) -> Result<Vec<QuizAttempt>, AppError> {
    access::owned_quiz(quizzes, quiz_id, principal).await?;
    attempts.list_attempts_by_quiz(quiz_id).await
}
