// src/services/access.rs

//! Ownership checks. Existence is always resolved before ownership, so a
//! missing entity reports NotFound even to a caller who could never own it.

use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        attempt::QuizAttempt,
        question::{Question, QuestionOption},
        quiz::Quiz,
        user::Principal,
    },
    repositories::{AttemptRepository, QuizRepository},
};

pub fn ensure_quiz_owner(quiz: &Quiz, principal: &Principal) -> Result<(), AppError> {
    if quiz.admin_id != principal.id {
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }
    Ok(())
}

pub fn ensure_attempt_owner(attempt: &QuizAttempt, principal: &Principal) -> Result<(), AppError> {
    if attempt.student_id != principal.id {
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }
    Ok(())
}

pub async fn find_quiz(quizzes: &dyn QuizRepository, id: Uuid) -> Result<Quiz, AppError> {
    quizzes
        .find_quiz(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
}

pub async fn owned_quiz(
    quizzes: &dyn QuizRepository,
    id: Uuid,
    principal: &Principal,
) -> Result<Quiz, AppError> {
    let quiz = find_quiz(quizzes, id).await?;
    ensure_quiz_owner(&quiz, principal)?;
    Ok(quiz)
}

/// Resolves a question and checks the principal owns its quiz.
pub async fn owned_question(
    quizzes: &dyn QuizRepository,
    id: Uuid,
    principal: &Principal,
) -> Result<Question, AppError> {
    let question = quizzes
        .find_question(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;
    owned_quiz(quizzes, question.quiz_id, principal).await?;
    Ok(question)
}

/// Resolves an option and checks the principal owns the quiz above it.
pub async fn owned_option(
    quizzes: &dyn QuizRepository,
    id: Uuid,
    principal: &Principal,
) -> Result<QuestionOption, AppError> {
    let option = quizzes
        .find_option(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Option not found".to_string()))?;
    owned_question(quizzes, option.question_id, principal).await?;
    Ok(option)
}

pub async fn owned_attempt(
    attempts: &dyn AttemptRepository,
    id: Uuid,
    principal: &Principal,
) -> Result<QuizAttempt, AppError> {
    let attempt = attempts
        .find_attempt(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;
    ensure_attempt_owner(&attempt, principal)?;
    Ok(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{quiz::QuizDraft, user::Role},
        repositories::MemoryStore,
    };

    fn admin() -> Principal {
        Principal { id: Uuid::new_v4(), role: Role::Admin }
    }

    fn draft() -> QuizDraft {
        QuizDraft {
            title: "Biology".to_string(),
            description: None,
            duration_minutes: 10,
            passing_score: 70,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_owner_passes() {
        let store = MemoryStore::new();
        let owner = admin();
        let quiz = store.create_quiz(owner.id, draft()).await.unwrap();

        let found = owned_quiz(&store, quiz.id, &owner).await.unwrap();
        assert_eq!(found.id, quiz.id);
    }

    #[tokio::test]
    async fn test_other_admin_forbidden() {
        let store = MemoryStore::new();
        let quiz = store.create_quiz(admin().id, draft()).await.unwrap();

        let err = owned_quiz(&store, quiz.id, &admin()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_not_found_before_forbidden() {
        let store = MemoryStore::new();

        let err = owned_quiz(&store, Uuid::new_v4(), &admin()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = owned_attempt(&store, Uuid::new_v4(), &admin()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
