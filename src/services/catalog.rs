// src/services/catalog.rs

use uuid::Uuid;

use crate::{
    config::DEFAULT_PASSING_SCORE,
    error::AppError,
    models::{
        question::{
            CreateOptionRequest, CreateQuestionRequest, OptionDraft, Question, QuestionDraft,
            QuestionOption, QuestionWithOptions, UpdateQuestionRequest,
        },
        quiz::{Quiz, QuizDetail, QuizDraft, QuizRequest},
        user::Principal,
    },
    repositories::QuizRepository,
    services::access,
    utils::html::{clean_html, clean_optional},
};

/// Sanitizes a required text field; markup-only or blank input is rejected.
fn required_text(input: &str, field: &str) -> Result<String, AppError> {
    let cleaned = clean_html(input.trim());
    if cleaned.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(cleaned.trim().to_string())
}

fn quiz_draft(req: QuizRequest) -> Result<QuizDraft, AppError> {
    let duration_minutes = req
        .duration_minutes
        .ok_or_else(|| AppError::BadRequest("Duration is required".to_string()))?;

    Ok(QuizDraft {
        title: required_text(&req.title, "Title")?,
        description: clean_optional(req.description.as_deref()),
        duration_minutes,
        passing_score: req.passing_score.unwrap_or(DEFAULT_PASSING_SCORE),
        is_active: req.is_active,
    })
}

/// Loads a quiz with every question and its options, in display order.
pub async fn quiz_detail(quizzes: &dyn QuizRepository, id: Uuid) -> Result<QuizDetail, AppError> {
    let quiz = access::find_quiz(quizzes, id).await?;
    let questions = questions_with_options(quizzes, id).await?;
    Ok(QuizDetail { quiz, questions })
}

pub async fn questions_with_options(
    quizzes: &dyn QuizRepository,
    quiz_id: Uuid,
) -> Result<Vec<QuestionWithOptions>, AppError> {
    let mut items = Vec::new();
    for question in quizzes.list_questions(quiz_id).await? {
        let options = quizzes.list_options(question.id).await?;
        items.push(QuestionWithOptions { question, options });
    }
    Ok(items)
}

pub async fn owned_quiz_detail(
    quizzes: &dyn QuizRepository,
    id: Uuid,
    principal: &Principal,
) -> Result<QuizDetail, AppError> {
    let quiz = access::owned_quiz(quizzes, id, principal).await?;
    let questions = questions_with_options(quizzes, id).await?;
    Ok(QuizDetail { quiz, questions })
}

pub async fn create_quiz(
    quizzes: &dyn QuizRepository,
    principal: &Principal,
    req: QuizRequest,
) -> Result<Quiz, AppError> {
    let draft = quiz_draft(req)?;
    let quiz = quizzes.create_quiz(principal.id, draft).await?;
    tracing::info!(quiz_id = %quiz.id, admin_id = %principal.id, "Quiz created");
    Ok(quiz)
}

pub async fn update_quiz(
    quizzes: &dyn QuizRepository,
    principal: &Principal,
    id: Uuid,
    req: QuizRequest,
) -> Result<Quiz, AppError> {
    let draft = quiz_draft(req)?;
    access::owned_quiz(quizzes, id, principal).await?;
    quizzes
        .update_quiz(id, draft)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
}

pub async fn delete_quiz(
    quizzes: &dyn QuizRepository,
    principal: &Principal,
    id: Uuid,
) -> Result<(), AppError> {
    access::owned_quiz(quizzes, id, principal).await?;
    if !quizzes.delete_quiz(id).await? {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }
    tracing::info!(quiz_id = %id, "Quiz deleted");
    Ok(())
}

pub async fn create_question(
    quizzes: &dyn QuizRepository,
    principal: &Principal,
    req: CreateQuestionRequest,
) -> Result<Question, AppError> {
    let quiz_id = req
        .quiz_id
        .ok_or_else(|| AppError::BadRequest("Quiz ID is required".to_string()))?;
    access::owned_quiz(quizzes, quiz_id, principal).await?;

    let draft = QuestionDraft {
        question_text: required_text(&req.question_text, "Question text")?,
        question_type: req.question_type,
        points: req.points.unwrap_or(1),
        order_num: req.order_num.unwrap_or(1),
    };
    quizzes.create_question(quiz_id, draft).await
}

pub async fn update_question(
    quizzes: &dyn QuizRepository,
    principal: &Principal,
    id: Uuid,
    req: UpdateQuestionRequest,
) -> Result<Question, AppError> {
    let current = access::owned_question(quizzes, id, principal).await?;

    // Options only exist on choice questions.
    if current.question_type.is_choice()
        && !req.question_type.is_choice()
        && !quizzes.list_options(id).await?.is_empty()
    {
        return Err(AppError::BadRequest(
            "Remove the options before turning this into a short answer question".to_string(),
        ));
    }

    let draft = QuestionDraft {
        question_text: required_text(&req.question_text, "Question text")?,
        question_type: req.question_type,
        points: req.points.unwrap_or(1),
        order_num: req.order_num.unwrap_or(1),
    };
    quizzes
        .update_question(id, draft)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))
}

pub async fn delete_question(
    quizzes: &dyn QuizRepository,
    principal: &Principal,
    id: Uuid,
) -> Result<(), AppError> {
    access::owned_question(quizzes, id, principal).await?;
    if !quizzes.delete_question(id).await? {
        return Err(AppError::NotFound("Question not found".to_string()));
    }
    Ok(())
}

/// Options only exist on choice questions.
pub async fn add_option(
    quizzes: &dyn QuizRepository,
    principal: &Principal,
    req: CreateOptionRequest,
) -> Result<QuestionOption, AppError> {
    let question_id = req
        .question_id
        .ok_or_else(|| AppError::BadRequest("Question ID is required".to_string()))?;
    let question = access::owned_question(quizzes, question_id, principal).await?;

    if !question.question_type.is_choice() {
        return Err(AppError::BadRequest(
            "Short answer questions do not take options".to_string(),
        ));
    }

    let draft = OptionDraft {
        option_text: required_text(&req.option_text, "Option text")?,
        is_correct: req.is_correct.unwrap_or(false),
        order_num: req.order_num.unwrap_or(1),
    };
    quizzes.create_option(question_id, draft).await
}

pub async fn delete_option(
    quizzes: &dyn QuizRepository,
    principal: &Principal,
    id: Uuid,
) -> Result<(), AppError> {
    access::owned_option(quizzes, id, principal).await?;
    if !quizzes.delete_option(id).await? {
        return Err(AppError::NotFound("Option not found".to_string()));
    }
    Ok(())
}
