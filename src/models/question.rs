// src/models/question.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Question type. Stored as the `question_type` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl QuestionType {
    /// Choice questions are answered by selecting an option and are auto-graded.
    pub fn is_choice(self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::TrueFalse)
    }
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,

    /// Points awarded for a correct answer. Always positive.
    pub points: i32,

    /// Display position within the quiz, ascending.
    pub order_num: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Represents the 'options' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: Uuid,
    pub question_id: Uuid,
    pub option_text: String,
    pub is_correct: bool,
    pub order_num: i32,
    pub created_at: DateTime<Utc>,
}

/// A question together with its ordered options.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionWithOptions {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<QuestionOption>,
}

/// DTO for sending a question to students (options without correctness flag).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub points: i32,
    pub order_num: i32,
    pub options: Vec<PublicOption>,
}

#[derive(Debug, Serialize)]
pub struct PublicOption {
    pub id: Uuid,
    pub option_text: String,
    pub order_num: i32,
}

impl From<QuestionWithOptions> for PublicQuestion {
    fn from(item: QuestionWithOptions) -> Self {
        let QuestionWithOptions { question, options } = item;
        Self {
            id: question.id,
            quiz_id: question.quiz_id,
            question_text: question.question_text,
            question_type: question.question_type,
            points: question.points,
            order_num: question.order_num,
            options: options
                .into_iter()
                .map(|o| PublicOption {
                    id: o.id,
                    option_text: o.option_text,
                    order_num: o.order_num,
                })
                .collect(),
        }
    }
}

/// Sanitized question fields handed to the store.
#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub question_text: String,
    pub question_type: QuestionType,
    pub points: i32,
    pub order_num: i32,
}

/// Sanitized option fields handed to the store.
#[derive(Debug, Clone)]
pub struct OptionDraft {
    pub option_text: String,
    pub is_correct: bool,
    pub order_num: i32,
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(required(message = "Quiz ID is required."))]
    pub quiz_id: Option<Uuid>,
    #[validate(length(min = 1, max = 2000, message = "Question text is required."))]
    pub question_text: String,
    pub question_type: QuestionType,
    #[validate(range(min = 1, max = 1000, message = "Points must be a positive integer."))]
    pub points: Option<i32>,
    #[validate(range(min = 0))]
    pub order_num: Option<i32>,
}

/// DTO for replacing a question's fields.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 2000, message = "Question text is required."))]
    pub question_text: String,
    pub question_type: QuestionType,
    #[validate(range(min = 1, max = 1000, message = "Points must be a positive integer."))]
    pub points: Option<i32>,
    #[validate(range(min = 0))]
    pub order_num: Option<i32>,
}

/// DTO for adding an option to a choice question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOptionRequest {
    #[validate(required(message = "Question ID is required."))]
    pub question_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255, message = "Option text is required."))]
    pub option_text: String,
    pub is_correct: Option<bool>,
    #[validate(range(min = 0))]
    pub order_num: Option<i32>,
}
